#![allow(dead_code)]

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use careerdesk::api::AppState;
use careerdesk::error::{ServiceError, ServiceResult};
use careerdesk::models::event::{
    Event, EventChanges, EventFilter, EventSort, EventSortField, EventStatus, SortOrder,
};
use careerdesk::repositories::EventStore;
use careerdesk::services::{Clock, EventService, FileStorage, FileUpload, LogEmailSender};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
    writes: AtomicUsize,
}

impl InMemoryEventStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn stored(&self, id: Uuid) -> Option<Event> {
        self.events.read().await.get(&id).cloned()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Same semantics as the SQL filter in `EventRepository::find_many`.
pub fn filter_matches(filter: &EventFilter, event: &Event) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = [&event.title, &event.description, &event.location, &event.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if filter.status.is_some_and(|status| event.status != status) {
        return false;
    }
    if filter.category.as_ref().is_some_and(|category| &event.category != category) {
        return false;
    }
    if filter.featured.is_some_and(|featured| event.featured != featured) {
        return false;
    }
    true
}

fn compare(a: &Event, b: &Event, field: EventSortField) -> std::cmp::Ordering {
    match field {
        EventSortField::StartDate => a.start_date.cmp(&b.start_date),
        EventSortField::EndDate => a.end_date.cmp(&b.end_date),
        EventSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        EventSortField::Title => a.title.cmp(&b.title),
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: &Event) -> Result<Uuid> {
        self.record_write();
        self.events.write().await.insert(event.id, event.clone());
        Ok(event.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        Ok(ids.iter().filter_map(|id| events.get(id).cloned()).collect())
    }

    async fn find_many(
        &self,
        filter: &EventFilter,
        sort: EventSort,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Event>, i64)> {
        let events = self.events.read().await;
        let mut matching: Vec<Event> = events.values().filter(|e| filter_matches(filter, e)).cloned().collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, sort.field).then_with(|| a.id.cmp(&b.id));
            match sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_by_id(&self, id: Uuid, changes: &EventChanges) -> Result<Option<Event>> {
        self.record_write();
        let mut events = self.events.write().await;
        Ok(events.get_mut(&id).map(|event| {
            changes.apply_to(event);
            event.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        self.record_write();
        Ok(self.events.write().await.remove(&id).is_some())
    }

    async fn update_many_status(&self, ids: &[Uuid], status: EventStatus) -> Result<u64> {
        self.record_write();
        let mut events = self.events.write().await;
        let mut count = 0;
        for id in ids {
            if let Some(event) = events.get_mut(id) {
                event.status = status;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        self.record_write();
        let mut events = self.events.write().await;
        Ok(ids.iter().filter(|id| events.remove(*id).is_some()).count() as u64)
    }
}

/// Keeps "files" in a set. Deletion can be made to fail to check that
/// callers treat it as best-effort.
#[derive(Default)]
pub struct MemoryFileStorage {
    files: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: std::sync::atomic::AtomicBool,
    counter: AtomicUsize,
}

impl MemoryFileStorage {
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.files.lock().unwrap().contains(reference)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn store(&self, upload: &FileUpload) -> ServiceResult<String> {
        if upload.bytes.is_empty() {
            return Err(ServiceError::validation("Uploaded file is empty"));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let reference = format!("/uploads/events/{}-{}", n, upload.file_name);
        self.files.lock().unwrap().insert(reference.clone());
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> bool {
        self.deleted.lock().unwrap().push(reference.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return false;
        }
        self.files.lock().unwrap().remove(reference)
    }
}

pub struct Harness {
    pub service: EventService,
    pub store: Arc<InMemoryEventStore>,
    pub files: Arc<MemoryFileStorage>,
    pub clock: Arc<ManualClock>,
}

pub fn harness_at(now: DateTime<Utc>) -> Harness {
    let store = Arc::new(InMemoryEventStore::default());
    let files = Arc::new(MemoryFileStorage::default());
    let clock = Arc::new(ManualClock::at(now));
    let service = EventService::new(store.clone(), files.clone(), clock.clone());
    Harness {
        service,
        store,
        files,
        clock,
    }
}

/// Router state around the in-memory event harness. Lead endpoints talk to
/// `pool`, so tests that never touch them can pass a lazy pool.
pub fn app_state(pool: PgPool, h: &Harness, resume_files: Arc<dyn FileStorage>) -> AppState {
    AppState {
        pool,
        events: h.service.clone(),
        mailer: Arc::new(LogEmailSender),
        resume_files,
        hr_inbox: "hr@careerdesk.local".to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}
