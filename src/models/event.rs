use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,

    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,

    pub organizer: Option<String>,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    pub image_url: Option<String>,

    pub status: EventStatus,

    pub featured: bool,

    pub registration_url: Option<String>,
    pub capacity: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Past,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Past => "past",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "past" => Ok(EventStatus::Past),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!("Unknown event status '{}'", other)),
        }
    }
}

/// Status a caller asks for on a write.
///
/// `Recompute` is sent as an empty string (or `"recompute"`) and means "drop
/// whatever is stored and derive from the dates again", which is how a
/// cancelled event is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedStatus {
    Recompute,
    Explicit(EventStatus),
}

impl FromStr for RequestedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("recompute") {
            return Ok(RequestedStatus::Recompute);
        }
        trimmed.parse().map(RequestedStatus::Explicit)
    }
}

impl<'de> Deserialize<'de> for RequestedStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<RequestedStatus>,
    pub featured: Option<bool>,
    pub registration_url: Option<String>,
    pub capacity: Option<i32>,
    pub organizer: Option<String>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<RequestedStatus>,
    pub featured: Option<bool>,
    pub registration_url: Option<String>,
    pub capacity: Option<i32>,
    pub organizer: Option<String>,
}

impl UpdateEvent {
    pub fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Column-level changes handed to the store once the service has resolved
/// the final status and image reference.
#[derive(Debug, Clone)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
    pub registration_url: Option<String>,
    pub capacity: Option<i32>,
    pub organizer: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EventChanges {
    pub fn from_update(update: UpdateEvent, updated_at: DateTime<Utc>) -> Self {
        Self {
            title: update.title,
            description: update.description,
            start_date: update.start_date,
            end_date: update.end_date,
            location: update.location,
            category: update.category,
            status: None,
            featured: update.featured,
            registration_url: update.registration_url,
            capacity: update.capacity,
            organizer: update.organizer,
            image_url: None,
            updated_at,
        }
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(category) = &self.category {
            event.category = category.clone();
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        if let Some(featured) = self.featured {
            event.featured = featured;
        }
        if let Some(registration_url) = &self.registration_url {
            event.registration_url = Some(registration_url.clone());
        }
        if let Some(capacity) = self.capacity {
            event.capacity = Some(capacity);
        }
        if let Some(organizer) = &self.organizer {
            event.organizer = Some(organizer.clone());
        }
        if let Some(image_url) = &self.image_url {
            event.image_url = Some(image_url.clone());
        }
        event.updated_at = self.updated_at;
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub search: Option<String>,
    pub status: Option<EventStatus>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum EventSortField {
    #[default]
    #[serde(rename = "startDate")]
    StartDate,
    #[serde(rename = "endDate")]
    EndDate,
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "title")]
    Title,
}

impl EventSortField {
    pub fn column(&self) -> &'static str {
        match self {
            EventSortField::StartDate => "start_date",
            EventSortField::EndDate => "end_date",
            EventSortField::CreatedAt => "created_at",
            EventSortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventSort {
    pub field: EventSortField,
    pub order: SortOrder,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub search: Option<String>,
    pub status: Option<EventStatus>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub sort: Option<EventSortField>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListEventsQuery {
    pub fn filter(&self) -> EventFilter {
        EventFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            status: self.status,
            category: self.category.clone().filter(|s| !s.trim().is_empty()),
            featured: self.featured,
        }
    }

    pub fn sort(&self) -> EventSort {
        EventSort {
            field: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Cancel,
    Delete,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(BulkAction::Cancel),
            "delete" => Ok(BulkAction::Delete),
            other => Err(format!("Invalid action '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEventRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

/// A validated create request, ready to become a row.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub featured: bool,
    pub registration_url: Option<String>,
    pub capacity: Option<i32>,
    pub organizer: Option<String>,
}

impl Event {
    pub fn new(
        fields: NewEvent,
        status: EventStatus,
        image_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            location: fields.location,
            category: fields.category,
            organizer: fields.organizer,
            start_date: fields.start_date,
            end_date: fields.end_date,
            image_url,
            status,
            featured: fields.featured,
            registration_url: fields.registration_url,
            capacity: fields.capacity,
            created_at: now,
            updated_at: now,
        }
    }
}
