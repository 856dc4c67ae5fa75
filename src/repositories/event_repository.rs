use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::event::{Event, EventChanges, EventFilter, EventSort, EventStatus};

/// Persistence seam for events. Every write is single-shot; callers see store
/// errors unchanged.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &Event) -> Result<Uuid>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Event>>;

    async fn find_many(
        &self,
        filter: &EventFilter,
        sort: EventSort,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Event>, i64)>;

    async fn update_by_id(&self, id: Uuid, changes: &EventChanges) -> Result<Option<Event>>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;

    async fn update_many_status(&self, ids: &[Uuid], status: EventStatus) -> Result<u64>;

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64>;
}

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR location ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR category ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    if let Some(category) = &filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.clone());
    }

    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ");
        builder.push_bind(featured);
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn insert(&self, event: &Event) -> Result<Uuid> {
        sqlx::query(
            "INSERT INTO careerdesk_events (id, title, description, location, category, organizer, start_date, end_date, image_url, status, featured, registration_url, capacity, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.category)
        .bind(&event.organizer)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.image_url)
        .bind(event.status)
        .bind(event.featured)
        .bind(&event.registration_url)
        .bind(event.capacity)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(event.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM careerdesk_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM careerdesk_events WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn find_many(
        &self,
        filter: &EventFilter,
        sort: EventSort,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Event>, i64)> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM careerdesk_events WHERE 1=1");
        push_filter(&mut count_builder, filter);
        let (total,): (i64,) = count_builder.build_query_as().fetch_one(&self.pool).await?;

        let mut query_builder = QueryBuilder::new("SELECT * FROM careerdesk_events WHERE 1=1");
        push_filter(&mut query_builder, filter);

        // Column and direction come from closed enums, never from raw input.
        query_builder.push(format!(
            " ORDER BY {} {}, id ASC LIMIT ",
            sort.field.column(),
            sort.order.keyword()
        ));
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(skip);

        let events = query_builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;

        Ok((events, total))
    }

    async fn update_by_id(&self, id: Uuid, changes: &EventChanges) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE careerdesk_events SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                start_date = COALESCE($3, start_date),
                end_date = COALESCE($4, end_date),
                location = COALESCE($5, location),
                category = COALESCE($6, category),
                status = COALESCE($7, status),
                featured = COALESCE($8, featured),
                registration_url = COALESCE($9, registration_url),
                capacity = COALESCE($10, capacity),
                organizer = COALESCE($11, organizer),
                image_url = COALESCE($12, image_url),
                updated_at = $13
             WHERE id = $14
             RETURNING *"
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(&changes.location)
        .bind(&changes.category)
        .bind(changes.status)
        .bind(changes.featured)
        .bind(&changes.registration_url)
        .bind(changes.capacity)
        .bind(&changes.organizer)
        .bind(&changes.image_url)
        .bind(changes.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM careerdesk_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_many_status(&self, ids: &[Uuid], status: EventStatus) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE careerdesk_events SET status = $1, updated_at = NOW() WHERE id = ANY($2)"
        )
        .bind(status)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM careerdesk_events WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
