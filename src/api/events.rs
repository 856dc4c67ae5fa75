use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::{
    extract::{ApiJson, ApiQuery},
    form::{parse_form_date, read_form},
    response::{ApiError, ApiResult},
    AppState,
};
use crate::models::event::{BulkEventRequest, CreateEvent, Event, ListEventsQuery, UpdateEvent};
use crate::services::{EventPage, FileUpload};

const IMAGE_FIELD: &str = "image";

/// Event fields plus an optional image, read from either a multipart form
/// (the admin UI) or a plain JSON body.
pub struct EventForm<T> {
    pub fields: T,
    pub image: Option<FileUpload>,
}

/// Converts one text field of the form into its JSON shape.
fn insert_form_value(map: &mut Map<String, Value>, name: &str, raw: String) -> Result<(), String> {
    match name {
        "startDate" | "endDate" => {
            if raw.trim().is_empty() {
                return Ok(());
            }
            let parsed = parse_form_date(&raw)?;
            map.insert(name.to_string(), json!(parsed));
        }
        "featured" => {
            map.insert(name.to_string(), json!(raw.trim() == "true"));
        }
        "capacity" => {
            if raw.trim().is_empty() {
                return Ok(());
            }
            let capacity: i32 = raw
                .trim()
                .parse()
                .map_err(|_| format!("Invalid capacity '{}'", raw))?;
            map.insert(name.to_string(), json!(capacity));
        }
        _ => {
            map.insert(name.to_string(), Value::String(raw));
        }
    }
    Ok(())
}

async fn read_multipart<T: DeserializeOwned>(multipart: Multipart) -> ApiResult<EventForm<T>> {
    let parts = read_form(multipart, IMAGE_FIELD, insert_form_value).await?;

    let fields = serde_json::from_value(Value::Object(parts.fields))
        .map_err(|e| ApiError::bad_request(format!("Invalid event fields: {}", e)))?;

    Ok(EventForm {
        fields,
        image: parts.file,
    })
}

impl<S, T> FromRequest<S> for EventForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            read_multipart(multipart).await
        } else {
            let Json(fields) = Json::<T>::from_request(req, state).await?;
            Ok(EventForm {
                fields,
                image: None,
            })
        }
    }
}

pub async fn create_event(
    State(state): State<AppState>,
    form: EventForm<CreateEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state.events.create(form.fields, form.image).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Event created successfully", "data": event})),
    ))
}

pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEventsQuery>,
) -> ApiResult<Json<EventPage>> {
    let page = state
        .events
        .list(&query.filter(), query.sort(), query.page, query.limit)
        .await?;

    Ok(Json(page))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.events.get(event_id).await?))
}

#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    form: EventForm<UpdateEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .events
        .update(event_id, form.fields, form.image)
        .await?;

    Ok(Json(json!({"message": "Event updated successfully", "data": event})))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.events.remove(event_id).await?;

    Ok(Json(json!({"message": "Event deleted successfully"})))
}

pub async fn bulk_events(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BulkEventRequest>,
) -> ApiResult<impl IntoResponse> {
    let count = state.events.bulk_apply(&payload.ids, &payload.action).await?;

    Ok(Json(json!({
        "message": format!("Applied '{}' to {} events", payload.action, count),
        "count": count,
    })))
}
