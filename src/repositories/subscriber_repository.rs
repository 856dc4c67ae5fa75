use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::event_repository::escape_like;
use crate::models::event::SortOrder;
use crate::models::subscriber::{Subscriber, SubscriberSortField, SubscriberStatus};

#[derive(Debug, Default)]
pub struct SubscriberFilter {
    pub search: Option<String>,
    pub status: Option<SubscriberStatus>,
}

pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &SubscriberFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR first_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

impl<'a> SubscriberRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inserts unless the email is already taken. Returns `false` on a
    /// duplicate so concurrent signups for one address resolve to a conflict.
    pub async fn create(&self, subscriber: &Subscriber) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO careerdesk_subscribers (id, email, first_name, status, last_email_sent, source, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (email) DO NOTHING"
        )
        .bind(subscriber.id)
        .bind(&subscriber.email)
        .bind(&subscriber.first_name)
        .bind(subscriber.status)
        .bind(subscriber.last_email_sent)
        .bind(&subscriber.source)
        .bind(subscriber.created_at)
        .bind(subscriber.updated_at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(
            "SELECT * FROM careerdesk_subscribers WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(subscriber)
    }

    pub async fn list(
        &self,
        filter: &SubscriberFilter,
        sort: SubscriberSortField,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Subscriber>, i64)> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM careerdesk_subscribers WHERE 1=1");
        push_filter(&mut count_builder, filter);
        let (total,): (i64,) = count_builder.build_query_as().fetch_one(self.pool).await?;

        let mut query_builder = QueryBuilder::new("SELECT * FROM careerdesk_subscribers WHERE 1=1");
        push_filter(&mut query_builder, filter);
        query_builder.push(format!(" ORDER BY {} {}, id ASC LIMIT ", sort.column(), order.keyword()));
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let subscribers = query_builder
            .build_query_as::<Subscriber>()
            .fetch_all(self.pool)
            .await?;

        Ok((subscribers, total))
    }

    pub async fn reactivate(&self, id: Uuid, first_name: &str) -> Result<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(
            "UPDATE careerdesk_subscribers SET status = 'active', first_name = $1, updated_at = NOW() WHERE id = $2 RETURNING *"
        )
        .bind(first_name)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(subscriber)
    }

    pub async fn update_status(&self, id: Uuid, status: Option<SubscriberStatus>) -> Result<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(
            "UPDATE careerdesk_subscribers SET status = COALESCE($1, status), updated_at = NOW() WHERE id = $2 RETURNING *"
        )
        .bind(status)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(subscriber)
    }

    pub async fn mark_emailed(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE careerdesk_subscribers SET last_email_sent = $1 WHERE id = $2")
            .bind(sent_at)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM careerdesk_subscribers WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_many_status(&self, ids: &[Uuid], status: SubscriberStatus) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE careerdesk_subscribers SET status = $1, updated_at = NOW() WHERE id = ANY($2)"
        )
        .bind(status)
        .bind(ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM careerdesk_subscribers WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
