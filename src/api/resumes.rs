use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{
    extract::{ApiJson, ApiQuery},
    form::{parse_form_date, read_form},
    response::{ApiError, ApiResult},
    AppState,
};
use crate::models::event::SortOrder;
use crate::models::resume::{
    BulkResumeRequest, ListResumesQuery, Resume, ResumeSubmission, UpdateResume,
};
use crate::repositories::{ResumeFilter, ResumeRepository};
use crate::services::email::{dispatch, EmailTemplate};
use crate::services::{FileStorage, Page, Paging};

const RESUME_FIELD: &str = "resume";

fn insert_text(map: &mut Map<String, Value>, name: &str, raw: String) -> Result<(), String> {
    map.insert(name.to_string(), Value::String(raw));
    Ok(())
}

async fn release_file(files: &dyn FileStorage, resume: &Resume) {
    if let Some(url) = &resume.resume_url {
        if !files.delete(url).await {
            warn!("Resume file {} for {} was not removed", url, resume.id);
        }
    }
}

pub async fn submit_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let parts = read_form(multipart?, RESUME_FIELD, insert_text).await?;

    let submission: ResumeSubmission = serde_json::from_value(Value::Object(parts.fields))
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {}", e)))?;
    let details = submission.validate().map_err(ApiError::bad_request)?;
    let upload = parts
        .file
        .ok_or_else(|| ApiError::bad_request("resume file is required"))?;

    let resume_url = state.resume_files.store(&upload).await?;
    let resume = Resume::new(details, upload.file_name, resume_url);

    let repo = ResumeRepository::new(&state.pool);
    if let Err(err) = repo.create(&resume).await {
        release_file(state.resume_files.as_ref(), &resume).await;
        return Err(ApiError::internal("Failed to submit resume", err));
    }

    info!("Received resume {} for {}", resume.id, resume.job_applied_for);

    let fields = json!({
        "fullName": resume.full_name,
        "email": resume.email,
        "contactNumber": resume.contact_number,
        "jobAppliedFor": resume.job_applied_for,
        "state": resume.state,
        "city": resume.city,
        "resumeFileName": resume.resume_file_name,
        "resumeUrl": resume.resume_url,
    });
    dispatch(
        state.mailer.clone(),
        EmailTemplate::ResumeReceived,
        state.hr_inbox.clone(),
        fields.clone(),
    );
    dispatch(
        state.mailer.clone(),
        EmailTemplate::ResumeConfirmation,
        resume.email.clone(),
        fields,
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Resume submitted successfully", "data": resume})),
    ))
}

pub async fn list_resumes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListResumesQuery>,
) -> ApiResult<impl IntoResponse> {
    let paging = Paging::resolve(query.page, query.limit)?;

    // A window needs both ends; a lone bound is ignored.
    let submitted_between = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) => {
            let from = parse_form_date(start).map_err(ApiError::bad_request)?;
            let to = parse_form_date(end).map_err(ApiError::bad_request)?;
            Some((from, to))
        }
        _ => None,
    };

    let filter = ResumeFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        status: query.status,
        submitted_between,
    };

    let repo = ResumeRepository::new(&state.pool);
    let (resumes, total) = repo
        .list(
            &filter,
            query.sort.unwrap_or_default(),
            query.order.unwrap_or(SortOrder::Desc),
            paging.limit,
            paging.offset(),
        )
        .await
        .map_err(|e| ApiError::internal("Failed to fetch resumes", e))?;

    Ok((StatusCode::OK, Json(Page::new(paging, total, resumes))))
}

pub async fn get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = ResumeRepository::new(&state.pool);
    let resume = repo
        .find_by_id(resume_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch resume", e))?
        .ok_or_else(|| ApiError::not_found("Resume not found"))?;

    Ok((StatusCode::OK, Json(resume)))
}

pub async fn update_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    ApiJson(changes): ApiJson<UpdateResume>,
) -> ApiResult<impl IntoResponse> {
    let repo = ResumeRepository::new(&state.pool);
    let resume = repo
        .update(resume_id, &changes)
        .await
        .map_err(|e| ApiError::internal("Failed to update resume", e))?
        .ok_or_else(|| ApiError::not_found("Resume not found"))?;

    Ok((
        StatusCode::OK,
        Json(json!({"message": "Resume updated successfully", "data": resume})),
    ))
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = ResumeRepository::new(&state.pool);
    let resume = repo
        .find_by_id(resume_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete resume", e))?
        .ok_or_else(|| ApiError::not_found("Resume not found"))?;

    release_file(state.resume_files.as_ref(), &resume).await;

    let deleted = repo
        .delete(resume_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete resume", e))?;
    if !deleted {
        return Err(ApiError::not_found("Resume not found"));
    }

    info!("Deleted resume {}", resume_id);

    Ok((
        StatusCode::OK,
        Json(json!({"message": "Resume deleted successfully"})),
    ))
}

pub async fn bulk_resumes(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BulkResumeRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.ids.is_empty() {
        return Err(ApiError::bad_request("No resume IDs provided"));
    }

    let repo = ResumeRepository::new(&state.pool);
    let (verb, result) = match payload.action.as_str() {
        "update" => {
            if payload.status.is_none() && payload.notes.is_none() {
                return Err(ApiError::bad_request(
                    "status or notes is required for bulk update",
                ));
            }
            let changes = UpdateResume {
                status: payload.status,
                notes: payload.notes,
            };
            ("Updated", repo.update_many(&payload.ids, &changes).await)
        }
        "delete" => {
            let doomed = repo
                .find_by_ids(&payload.ids)
                .await
                .map_err(|e| ApiError::internal("Failed to perform bulk operation", e))?;
            for resume in &doomed {
                release_file(state.resume_files.as_ref(), resume).await;
            }
            ("Deleted", repo.delete_many(&payload.ids).await)
        }
        _ => return Err(ApiError::bad_request("Invalid action specified")),
    };

    let count = result.map_err(|e| ApiError::internal("Failed to perform bulk operation", e))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("{} {} resumes successfully", verb, count),
            "count": count,
        })),
    ))
}
