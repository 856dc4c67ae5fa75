use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::SortOrder;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub job_applied_for: String,
    pub state: String,
    pub city: String,

    /// Name of the file as the applicant uploaded it.
    pub resume_file_name: String,
    pub resume_url: Option<String>,

    pub status: ResumeStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "resume_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResumeStatus {
    New,
    Reviewed,
    Contacted,
    Interviewed,
    Rejected,
    Hired,
}

/// Text fields of the application form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSubmission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub job_applied_for: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

/// A submission whose required fields are all present.
#[derive(Debug, Clone)]
pub struct ApplicantDetails {
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub job_applied_for: String,
    pub state: String,
    pub city: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

impl ResumeSubmission {
    pub fn validate(self) -> Result<ApplicantDetails, String> {
        Ok(ApplicantDetails {
            full_name: required(self.full_name, "fullName")?,
            email: required(self.email, "email")?,
            contact_number: required(self.contact_number, "contactNumber")?,
            job_applied_for: required(self.job_applied_for, "jobAppliedFor")?,
            state: required(self.state, "state")?,
            city: required(self.city, "city")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateResume {
    pub status: Option<ResumeStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ResumeSortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "jobAppliedFor")]
    JobAppliedFor,
    #[serde(rename = "status")]
    Status,
}

impl ResumeSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ResumeSortField::CreatedAt => "created_at",
            ResumeSortField::UpdatedAt => "updated_at",
            ResumeSortField::FullName => "full_name",
            ResumeSortField::JobAppliedFor => "job_applied_for",
            ResumeSortField::Status => "status",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResumesQuery {
    pub search: Option<String>,
    pub status: Option<ResumeStatus>,
    pub sort: Option<ResumeSortField>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Lower bound on `createdAt`; only applied together with `endDate`.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkResumeRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<Uuid>,
    pub status: Option<ResumeStatus>,
    pub notes: Option<String>,
}

impl Resume {
    pub fn new(details: ApplicantDetails, resume_file_name: String, resume_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: details.full_name,
            email: details.email,
            contact_number: details.contact_number,
            job_applied_for: details.job_applied_for,
            state: details.state,
            city: details.city,
            resume_file_name,
            resume_url: Some(resume_url),
            status: ResumeStatus::New,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
