use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::{extract::ApiJson, response::ApiError, AppState};
use crate::models::enquiry::{CreateEnquiry, Enquiry, UpdateEnquiry};
use crate::repositories::EnquiryRepository;
use crate::services::email::{dispatch, EmailTemplate};

pub async fn create_enquiry(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEnquiry>,
) -> Result<impl IntoResponse, ApiError> {
    let enquiry = Enquiry::new(payload).map_err(ApiError::bad_request)?;

    let repo = EnquiryRepository::new(&state.pool);
    if let Err(err) = repo.create(&enquiry).await {
        error!("Failed to save enquiry: {}", err);
        return Err(ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to save enquiry".to_string(),
        });
    }

    info!("Saved enquiry {} from {}", enquiry.id, enquiry.email);

    let fields = json!({
        "fullName": enquiry.name,
        "email": enquiry.email,
        "contactNumber": enquiry.contact,
        "state": enquiry.state,
        "city": enquiry.city,
        "category": enquiry.enquire,
        "message": enquiry.enquire_detail,
    });
    dispatch(
        state.mailer.clone(),
        EmailTemplate::EnquiryNotification,
        state.hr_inbox.clone(),
        fields.clone(),
    );
    dispatch(
        state.mailer.clone(),
        EmailTemplate::EnquiryAcknowledgement,
        enquiry.email.clone(),
        fields,
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Enquiry saved successfully", "data": enquiry})),
    ))
}

pub async fn list_enquiries(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = EnquiryRepository::new(&state.pool);
    match repo.list_with_duplicates().await {
        Ok(enquiries) => Ok((StatusCode::OK, Json(json!(enquiries)))),
        Err(err) => {
            error!("Failed to fetch enquiries: {}", err);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to fetch enquiries".to_string(),
            })
        }
    }
}

pub async fn list_duplicates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = EnquiryRepository::new(&state.pool);
    match repo.duplicate_emails().await {
        Ok(duplicates) => Ok((StatusCode::OK, Json(json!(duplicates)))),
        Err(err) => {
            error!("Failed to group enquiries by email: {}", err);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to fetch duplicate enquiries".to_string(),
            })
        }
    }
}

pub async fn update_enquiry(
    State(state): State<AppState>,
    Path(enquiry_id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateEnquiry>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = EnquiryRepository::new(&state.pool);
    match repo.update(enquiry_id, &payload).await {
        Ok(Some(enquiry)) => {
            info!("Updated enquiry {}", enquiry_id);
            Ok((
                StatusCode::OK,
                Json(json!({"message": "Enquiry updated successfully", "data": enquiry})),
            ))
        }
        Ok(None) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Enquiry not found"})),
        )),
        Err(err) => {
            error!("Failed to update enquiry: {}", err);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to update enquiry".to_string(),
            })
        }
    }
}
