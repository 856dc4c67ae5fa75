use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::SortOrder;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub status: SubscriberStatus,
    pub last_email_sent: Option<DateTime<Utc>>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "subscriber_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
    Bounced,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriber {
    pub status: Option<SubscriberStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SubscriberSortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "firstName")]
    FirstName,
}

impl SubscriberSortField {
    pub fn column(&self) -> &'static str {
        match self {
            SubscriberSortField::CreatedAt => "created_at",
            SubscriberSortField::Email => "email",
            SubscriberSortField::FirstName => "first_name",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListSubscribersQuery {
    pub search: Option<String>,
    pub status: Option<SubscriberStatus>,
    pub sort: Option<SubscriberSortField>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkSubscriberRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<Uuid>,
    pub status: Option<SubscriberStatus>,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl Subscriber {
    pub fn new(email: &str, first_name: &str, source: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            first_name: first_name.trim().to_string(),
            status: SubscriberStatus::Active,
            last_email_sent: None,
            source: source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "website".to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subscriber_normalizes_email() {
        let subscriber = Subscriber::new("  Ravi@Example.COM ", " Ravi ", None);
        assert_eq!(subscriber.email, "ravi@example.com");
        assert_eq!(subscriber.first_name, "Ravi");
        assert_eq!(subscriber.source, "website");
        assert_eq!(subscriber.status, SubscriberStatus::Active);
    }
}
