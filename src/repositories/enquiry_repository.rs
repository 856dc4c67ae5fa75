use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::enquiry::{DuplicateEmail, Enquiry, EnquiryWithDuplicates, UpdateEnquiry};

pub struct EnquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EnquiryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, enquiry: &Enquiry) -> Result<()> {
        sqlx::query(
            "INSERT INTO careerdesk_enquiries (id, name, email, contact, state, city, enquire, enquire_detail, status, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        )
        .bind(enquiry.id)
        .bind(&enquiry.name)
        .bind(&enquiry.email)
        .bind(&enquiry.contact)
        .bind(&enquiry.state)
        .bind(&enquiry.city)
        .bind(&enquiry.enquire)
        .bind(&enquiry.enquire_detail)
        .bind(enquiry.status)
        .bind(&enquiry.notes)
        .bind(enquiry.created_at)
        .bind(enquiry.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_with_duplicates(&self) -> Result<Vec<EnquiryWithDuplicates>> {
        let enquiries = sqlx::query_as::<_, EnquiryWithDuplicates>(
            "SELECT *, COUNT(*) OVER (PARTITION BY LOWER(email)) AS duplicate_count
             FROM careerdesk_enquiries
             ORDER BY created_at DESC"
        )
        .fetch_all(self.pool)
        .await?;

        Ok(enquiries)
    }

    pub async fn duplicate_emails(&self) -> Result<Vec<DuplicateEmail>> {
        let duplicates = sqlx::query_as::<_, DuplicateEmail>(
            "SELECT LOWER(email) AS email, COUNT(*) AS count, MAX(created_at) AS last_enquiry_at
             FROM careerdesk_enquiries
             GROUP BY LOWER(email)
             HAVING COUNT(*) > 1
             ORDER BY count DESC, last_enquiry_at DESC"
        )
        .fetch_all(self.pool)
        .await?;

        Ok(duplicates)
    }

    pub async fn update(&self, id: Uuid, changes: &UpdateEnquiry) -> Result<Option<Enquiry>> {
        let enquiry = sqlx::query_as::<_, Enquiry>(
            "UPDATE careerdesk_enquiries
             SET status = COALESCE($1, status), notes = COALESCE($2, notes), updated_at = NOW()
             WHERE id = $3
             RETURNING *"
        )
        .bind(changes.status)
        .bind(&changes.notes)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(enquiry)
    }
}
