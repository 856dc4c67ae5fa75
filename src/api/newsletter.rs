use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{
    extract::{ApiJson, ApiQuery},
    response::ApiError,
    AppState,
};
use crate::models::event::SortOrder;
use crate::models::subscriber::{
    normalize_email, BulkSubscriberRequest, ListSubscribersQuery, Subscribe, Subscriber,
    SubscriberStatus, UpdateSubscriber,
};
use crate::repositories::{SubscriberFilter, SubscriberRepository};
use crate::services::email::{EmailSender, EmailTemplate};
use crate::services::{Page, Paging};

fn already_subscribed() -> ApiError {
    ApiError {
        status: StatusCode::CONFLICT,
        message: "This email is already subscribed to our newsletter.".to_string(),
    }
}

/// Sends the welcome mail in the background and stamps `lastEmailSent` once
/// the relay accepts it.
fn send_welcome(mailer: Arc<dyn EmailSender>, pool: PgPool, subscriber: &Subscriber) {
    let id = subscriber.id;
    let email = subscriber.email.clone();
    let fields = json!({"firstName": subscriber.first_name});

    tokio::spawn(async move {
        if let Err(err) = mailer.send(EmailTemplate::NewsletterWelcome, &email, fields).await {
            warn!("Welcome mail to {} failed: {}", email, err);
            return;
        }
        if let Err(err) = SubscriberRepository::new(&pool).mark_emailed(id, Utc::now()).await {
            warn!("Failed to record welcome mail for {}: {}", id, err);
        }
    });
}

pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Subscribe>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("email is required"))?;
    let first_name = payload
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("firstName is required"))?
        .to_string();

    let repo = SubscriberRepository::new(&state.pool);

    let existing = repo
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Failed to subscribe to newsletter", e))?;

    if let Some(existing) = existing {
        if existing.status == SubscriberStatus::Unsubscribed {
            let reactivated = repo
                .reactivate(existing.id, &first_name)
                .await
                .map_err(|e| ApiError::internal("Failed to reactivate subscription", e))?;
            info!("Reactivated newsletter subscription for {}", email);
            return Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Welcome back! Your subscription has been reactivated.",
                    "data": reactivated,
                })),
            ));
        }

        return Err(already_subscribed());
    }

    let subscriber = Subscriber::new(&email, &first_name, payload.source);
    let inserted = repo
        .create(&subscriber)
        .await
        .map_err(|e| ApiError::internal("Failed to subscribe to newsletter", e))?;
    if !inserted {
        return Err(already_subscribed());
    }

    info!("New newsletter subscriber {}", subscriber.id);

    send_welcome(state.mailer.clone(), state.pool.clone(), &subscriber);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Successfully subscribed to the newsletter!",
            "data": subscriber,
        })),
    ))
}

pub async fn list_subscribers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListSubscribersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let paging = Paging::resolve(query.page, query.limit)?;

    let filter = SubscriberFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        status: query.status,
    };
    let order = query.order.unwrap_or(SortOrder::Desc);

    let repo = SubscriberRepository::new(&state.pool);
    let (subscribers, total) = repo
        .list(
            &filter,
            query.sort.unwrap_or_default(),
            order,
            paging.limit,
            paging.offset(),
        )
        .await
        .map_err(|e| ApiError::internal("Failed to fetch newsletter subscribers", e))?;

    Ok((StatusCode::OK, Json(Page::new(paging, total, subscribers))))
}

pub async fn update_subscriber(
    State(state): State<AppState>,
    Path(subscriber_id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateSubscriber>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = SubscriberRepository::new(&state.pool);
    match repo.update_status(subscriber_id, payload.status).await {
        Ok(Some(subscriber)) => Ok((
            StatusCode::OK,
            Json(json!({"message": "Subscriber updated successfully", "data": subscriber})),
        )),
        Ok(None) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Subscriber not found"})),
        )),
        Err(err) => Err(ApiError::internal("Failed to update subscriber", err)),
    }
}

pub async fn delete_subscriber(
    State(state): State<AppState>,
    Path(subscriber_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = SubscriberRepository::new(&state.pool);
    match repo.delete(subscriber_id).await {
        Ok(true) => {
            info!("Deleted subscriber {}", subscriber_id);
            Ok((
                StatusCode::OK,
                Json(json!({"message": "Subscriber deleted successfully"})),
            ))
        }
        Ok(false) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Subscriber not found"})),
        )),
        Err(err) => Err(ApiError::internal("Failed to delete subscriber", err)),
    }
}

pub async fn bulk_subscribers(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BulkSubscriberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.ids.is_empty() {
        return Err(ApiError::bad_request("No subscriber IDs provided"));
    }

    let repo = SubscriberRepository::new(&state.pool);
    let (verb, result) = match payload.action.as_str() {
        "update" => {
            let status = payload
                .status
                .ok_or_else(|| ApiError::bad_request("status is required for bulk update"))?;
            ("Updated", repo.update_many_status(&payload.ids, status).await)
        }
        "delete" => ("Deleted", repo.delete_many(&payload.ids).await),
        _ => return Err(ApiError::bad_request("Invalid action specified")),
    };

    let count = result.map_err(|e| ApiError::internal("Failed to perform bulk operation", e))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("{} {} subscribers successfully", verb, count),
            "count": count,
        })),
    ))
}
