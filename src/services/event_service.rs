use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::{derive_status, status_at};
use crate::error::{ServiceError, ServiceResult};
use crate::models::event::{
    BulkAction, CreateEvent, Event, EventChanges, EventFilter, EventSort, EventStatus, NewEvent,
    UpdateEvent,
};
use crate::repositories::EventStore;

use super::clock::Clock;
use super::file_storage::{FileStorage, FileUpload};
use super::paging::{Page, Paging};

pub type EventPage = Page<Event>;

/// Runs every event write through the lifecycle deriver and keeps the
/// attached image in step with the record.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    files: Arc<dyn FileStorage>,
    clock: Arc<dyn Clock>,
}

fn required_text(value: Option<String>, field: &str) -> ServiceResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{} is required", field))),
    }
}

fn non_blank(value: Option<String>, field: &str) -> ServiceResult<Option<String>> {
    match value {
        Some(v) => required_text(Some(v), field).map(Some),
        None => Ok(None),
    }
}

fn check_capacity(capacity: Option<i32>) -> ServiceResult<()> {
    match capacity {
        Some(c) if c < 0 => Err(ServiceError::validation("capacity cannot be negative")),
        _ => Ok(()),
    }
}

fn check_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<()> {
    if start > end {
        return Err(ServiceError::validation(
            "startDate must not be later than endDate",
        ));
    }
    Ok(())
}

fn validate_new(fields: &CreateEvent) -> ServiceResult<NewEvent> {
    let start_date = fields
        .start_date
        .ok_or_else(|| ServiceError::validation("startDate is required"))?;
    let end_date = fields
        .end_date
        .ok_or_else(|| ServiceError::validation("endDate is required"))?;

    let new_event = NewEvent {
        title: required_text(fields.title.clone(), "title")?,
        description: required_text(fields.description.clone(), "description")?,
        start_date,
        end_date,
        location: required_text(fields.location.clone(), "location")?,
        category: required_text(fields.category.clone(), "category")?,
        featured: fields.featured.unwrap_or(false),
        registration_url: fields.registration_url.clone(),
        capacity: fields.capacity,
        organizer: fields.organizer.clone(),
    };

    check_interval(new_event.start_date, new_event.end_date)?;
    check_capacity(new_event.capacity)?;

    Ok(new_event)
}

impl EventService {
    pub fn new(
        store: Arc<dyn EventStore>,
        files: Arc<dyn FileStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            files,
            clock,
        }
    }

    async fn release_image(&self, reference: &str) {
        if !self.files.delete(reference).await {
            warn!("Could not remove stored image {}", reference);
        }
    }

    pub async fn create(
        &self,
        fields: CreateEvent,
        image: Option<FileUpload>,
    ) -> ServiceResult<Event> {
        let new_event = validate_new(&fields)?;

        let image_url = match image {
            Some(upload) => Some(self.files.store(&upload).await?),
            None => None,
        };

        let now = self.clock.now();
        let status = derive_status(now, new_event.start_date, new_event.end_date, fields.status);
        let event = Event::new(new_event, status, image_url, now);

        if let Err(err) = self.store.insert(&event).await {
            if let Some(reference) = &event.image_url {
                self.release_image(reference).await;
            }
            return Err(err.into());
        }

        info!("Created event {} with status '{}'", event.id, event.status);

        Ok(event)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Event> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event not found"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateEvent,
        image: Option<FileUpload>,
    ) -> ServiceResult<Event> {
        let existing = self.get(id).await?;

        let patch = UpdateEvent {
            title: non_blank(patch.title, "title")?,
            description: non_blank(patch.description, "description")?,
            location: non_blank(patch.location, "location")?,
            category: non_blank(patch.category, "category")?,
            ..patch
        };
        check_capacity(patch.capacity)?;

        let start = patch.start_date.unwrap_or(existing.start_date);
        let end = patch.end_date.unwrap_or(existing.end_date);
        check_interval(start, end)?;

        let now = self.clock.now();
        let status = match patch.status {
            Some(requested) => Some(derive_status(now, start, end, Some(requested))),
            None if patch.touches_dates() && existing.status != EventStatus::Cancelled => {
                Some(status_at(now, start, end))
            }
            None => None,
        };

        let new_image = match image {
            Some(upload) => Some(self.files.store(&upload).await?),
            None => None,
        };

        let mut changes = EventChanges::from_update(patch, now);
        changes.status = status;
        changes.image_url = new_image.clone();

        let updated = match self.store.update_by_id(id, &changes).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                if let Some(reference) = &new_image {
                    self.release_image(reference).await;
                }
                return Err(ServiceError::not_found("Event not found"));
            }
            Err(err) => {
                if let Some(reference) = &new_image {
                    self.release_image(reference).await;
                }
                return Err(err.into());
            }
        };

        if new_image.is_some() {
            if let Some(old) = existing.image_url.as_deref() {
                self.release_image(old).await;
            }
        }

        info!("Updated event {} (status '{}')", updated.id, updated.status);

        Ok(updated)
    }

    pub async fn remove(&self, id: Uuid) -> ServiceResult<()> {
        let existing = self.get(id).await?;

        if let Some(reference) = existing.image_url.as_deref() {
            self.release_image(reference).await;
        }

        if !self.store.delete_by_id(id).await? {
            return Err(ServiceError::not_found("Event not found"));
        }

        info!("Deleted event {}", id);

        Ok(())
    }

    pub async fn bulk_apply(&self, ids: &[Uuid], action: &str) -> ServiceResult<u64> {
        if ids.is_empty() {
            return Err(ServiceError::validation("No event IDs provided"));
        }
        let action: BulkAction = action.parse().map_err(ServiceError::Validation)?;

        let count = match action {
            BulkAction::Cancel => {
                self.store
                    .update_many_status(ids, EventStatus::Cancelled)
                    .await?
            }
            BulkAction::Delete => {
                let events = self.store.find_by_ids(ids).await?;
                for reference in events.iter().filter_map(|e| e.image_url.as_deref()) {
                    self.release_image(reference).await;
                }
                self.store.delete_many(ids).await?
            }
        };

        info!("Bulk {:?} applied to {} of {} events", action, count, ids.len());

        Ok(count)
    }

    pub async fn list(
        &self,
        filter: &EventFilter,
        sort: EventSort,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> ServiceResult<EventPage> {
        let paging = Paging::resolve(page, page_size)?;

        let (data, total) = self
            .store
            .find_many(filter, sort, paging.offset(), paging.limit)
            .await?;

        Ok(Page::new(paging, total, data))
    }
}
