pub mod enquiries;
pub mod events;
pub mod extract;
pub mod form;
pub mod health;
pub mod newsletter;
pub mod response;
pub mod resumes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{EmailSender, EventService, FileStorage};

/// Multipart framing and text fields on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub events: EventService,
    pub mailer: Arc<dyn EmailSender>,
    pub resume_files: Arc<dyn FileStorage>,
    pub hr_inbox: String,
    /// Largest single file any form accepts.
    pub max_upload_bytes: usize,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/events/bulk", post(events::bulk_events))
        .route(
            "/api/events/{id}",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/api/enquiries",
            get(enquiries::list_enquiries).post(enquiries::create_enquiry),
        )
        .route("/api/enquiries/duplicates", get(enquiries::list_duplicates))
        .route("/api/enquiries/{id}", patch(enquiries::update_enquiry))
        .route(
            "/api/newsletter",
            get(newsletter::list_subscribers).post(newsletter::subscribe),
        )
        .route("/api/newsletter/bulk", post(newsletter::bulk_subscribers))
        .route(
            "/api/newsletter/{id}",
            patch(newsletter::update_subscriber).delete(newsletter::delete_subscriber),
        )
        .route(
            "/api/resumes",
            get(resumes::list_resumes).post(resumes::submit_resume),
        )
        .route("/api/resumes/bulk", post(resumes::bulk_resumes))
        .route(
            "/api/resumes/{id}",
            get(resumes::get_resume)
                .patch(resumes::update_resume)
                .delete(resumes::delete_resume),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
