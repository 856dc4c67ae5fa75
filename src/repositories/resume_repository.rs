use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::event_repository::escape_like;
use crate::models::event::SortOrder;
use crate::models::resume::{Resume, ResumeSortField, ResumeStatus, UpdateResume};

#[derive(Debug, Default)]
pub struct ResumeFilter {
    pub search: Option<String>,
    pub status: Option<ResumeStatus>,
    /// Inclusive `created_at` window.
    pub submitted_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

pub struct ResumeRepository<'a> {
    pool: &'a PgPool,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ResumeFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        let mut columns = ["full_name", "email", "job_applied_for", "state", "city"].iter();
        builder.push(" AND (");
        if let Some(first) = columns.next() {
            builder.push(format!("{} ILIKE ", first));
            builder.push_bind(pattern.clone());
        }
        for column in columns {
            builder.push(format!(" OR {} ILIKE ", column));
            builder.push_bind(pattern.clone());
        }
        builder.push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    if let Some((from, to)) = filter.submitted_between {
        builder.push(" AND created_at BETWEEN ");
        builder.push_bind(from);
        builder.push(" AND ");
        builder.push_bind(to);
    }
}

impl<'a> ResumeRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, resume: &Resume) -> Result<()> {
        sqlx::query(
            "INSERT INTO careerdesk_resumes (id, full_name, email, contact_number, job_applied_for, state, city, resume_file_name, resume_url, status, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        )
        .bind(resume.id)
        .bind(&resume.full_name)
        .bind(&resume.email)
        .bind(&resume.contact_number)
        .bind(&resume.job_applied_for)
        .bind(&resume.state)
        .bind(&resume.city)
        .bind(&resume.resume_file_name)
        .bind(&resume.resume_url)
        .bind(resume.status)
        .bind(&resume.notes)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resume>> {
        let resume = sqlx::query_as::<_, Resume>("SELECT * FROM careerdesk_resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(resume)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Resume>> {
        let resumes = sqlx::query_as::<_, Resume>("SELECT * FROM careerdesk_resumes WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        Ok(resumes)
    }

    pub async fn list(
        &self,
        filter: &ResumeFilter,
        sort: ResumeSortField,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Resume>, i64)> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM careerdesk_resumes WHERE 1=1");
        push_filter(&mut count_builder, filter);
        let (total,): (i64,) = count_builder.build_query_as().fetch_one(self.pool).await?;

        let mut query_builder = QueryBuilder::new("SELECT * FROM careerdesk_resumes WHERE 1=1");
        push_filter(&mut query_builder, filter);
        query_builder.push(format!(" ORDER BY {} {}, id ASC LIMIT ", sort.column(), order.keyword()));
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let resumes = query_builder
            .build_query_as::<Resume>()
            .fetch_all(self.pool)
            .await?;

        Ok((resumes, total))
    }

    pub async fn update(&self, id: Uuid, changes: &UpdateResume) -> Result<Option<Resume>> {
        let resume = sqlx::query_as::<_, Resume>(
            "UPDATE careerdesk_resumes
             SET status = COALESCE($1, status), notes = COALESCE($2, notes), updated_at = NOW()
             WHERE id = $3
             RETURNING *"
        )
        .bind(changes.status)
        .bind(&changes.notes)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(resume)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM careerdesk_resumes WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_many(&self, ids: &[Uuid], changes: &UpdateResume) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE careerdesk_resumes
             SET status = COALESCE($1, status), notes = COALESCE($2, notes), updated_at = NOW()
             WHERE id = ANY($3)"
        )
        .bind(changes.status)
        .bind(&changes.notes)
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM careerdesk_resumes WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
