use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub state: String,
    pub city: String,
    pub enquire: String,
    pub enquire_detail: String,
    pub status: EnquiryStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "enquiry_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EnquiryStatus {
    New,
    InProgress,
    Contacted,
    FollowUp,
    Converted,
    Closed,
}

/// An enquiry as listed to admins, with how many enquiries share its email.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryWithDuplicates {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub enquiry: Enquiry,
    pub duplicate_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEmail {
    pub email: String,
    pub count: i64,
    pub last_enquiry_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnquiry {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub enquire: Option<String>,
    pub enquire_detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnquiry {
    pub status: Option<EnquiryStatus>,
    pub notes: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

impl Enquiry {
    pub fn new(create: CreateEnquiry) -> Result<Self, String> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: required(create.name, "name")?,
            email: required(create.email, "email")?,
            contact: required(create.contact, "contact")?,
            state: required(create.state, "state")?,
            city: required(create.city, "city")?,
            enquire: required(create.enquire, "enquire")?,
            enquire_detail: required(create.enquire_detail, "enquireDetail")?,
            status: EnquiryStatus::New,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
    }
}
