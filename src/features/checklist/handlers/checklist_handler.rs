use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::checklist::dtos::{
    is_photo_type_allowed, ChecklistEntryDto, ChecklistQuery, DeviceAuditInput,
    ExpectedLocationDto, SubmitChecklistDto, SubmitChecklistForm, UpsertExpectedLocationDto,
};
use crate::features::checklist::routes::ChecklistState;
use crate::features::checklist::services::{parse_photo_timestamp, SubmissionRequest};
use crate::shared::types::{ApiResponse, Meta};

/// Submit a checklist photo for a location slot
///
/// Accepts multipart/form-data. Re-submitting the same
/// `(location, day, month, year)` slot replaces the prior record.
#[utoipa::path(
    post,
    path = "/api/checklist",
    tag = "checklist",
    request_body(
        content = SubmitChecklistDto,
        content_type = "multipart/form-data",
        description = "Photo plus slot fields; coordinates and capture timestamp optional",
    ),
    responses(
        (status = 201, description = "Entry persisted", body = ApiResponse<ChecklistEntryDto>),
        (status = 400, description = "Invalid fields or photo"),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Watermark composition failed"),
        (status = 429, description = "Rate limit exceeded")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_checklist(
    user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ChecklistEntryDto>>), AppError> {
    state
        .rate_limiter
        .check(&user.account_id)
        .await
        .map_err(|e| AppError::RateLimitExceeded(e.to_string()))?;

    let mut photo: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut location: Option<String> = None;
    let mut day: Option<i32> = None;
    let mut month: Option<i32> = None;
    let mut year: Option<i32> = None;
    let mut score: Option<i32> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;
    let mut photo_timestamp = None;
    let mut device: Option<DeviceAuditInput> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "photo" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                if !is_photo_type_allowed(&ct) {
                    return Err(AppError::BadRequest(format!(
                        "Unsupported photo type: {}",
                        ct
                    )));
                }

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read photo bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read photo data: {}", e))
                })?;

                photo = Some(data.to_vec());
                content_type = Some(ct);
            }
            "location" => location = Some(read_text(field).await?),
            "day" => day = Some(read_int(field, "day").await?),
            "month" => month = Some(read_int(field, "month").await?),
            "year" => year = Some(read_int(field, "year").await?),
            "score" => score = Some(read_int(field, "score").await?),
            "latitude" => latitude = Some(read_float(field, "latitude").await?),
            "longitude" => longitude = Some(read_float(field, "longitude").await?),
            "photo_timestamp" => {
                photo_timestamp = Some(parse_photo_timestamp(&read_text(field).await?)?);
            }
            "device_info" => {
                let raw = read_text(field).await?;
                device = Some(serde_json::from_str(&raw).map_err(|e| {
                    AppError::BadRequest(format!("Invalid device_info payload: {}", e))
                })?);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let photo = photo.ok_or_else(|| AppError::BadRequest("Missing photo".to_string()))?;
    if photo.is_empty() {
        return Err(AppError::BadRequest("Empty photo".to_string()));
    }

    let form = SubmitChecklistForm {
        location: location.ok_or_else(|| AppError::BadRequest("Missing location".to_string()))?,
        day: day.ok_or_else(|| AppError::BadRequest("Missing day".to_string()))?,
        month: month.ok_or_else(|| AppError::BadRequest("Missing month".to_string()))?,
        year: year.ok_or_else(|| AppError::BadRequest("Missing year".to_string()))?,
        score: score.ok_or_else(|| AppError::BadRequest("Missing score".to_string()))?,
        latitude,
        longitude,
        photo_timestamp,
        device,
    };

    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    form.validate_calendar_date().map_err(AppError::Validation)?;

    let entry = state
        .submissions
        .submit(
            &user.account_id,
            SubmissionRequest {
                photo,
                content_type: content_type.unwrap_or_else(|| "image/jpeg".to_string()),
                form,
            },
        )
        .await?;

    let dto = ChecklistEntryDto::from_entry(&entry, &state.fraud_policy);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(dto), None, None)),
    ))
}

/// List checklist entries, newest first
#[utoipa::path(
    get,
    path = "/api/checklist",
    tag = "checklist",
    params(ChecklistQuery),
    responses(
        (status = 200, description = "Paginated entries", body = ApiResponse<Vec<ChecklistEntryDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_entries(
    _user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    Query(query): Query<ChecklistQuery>,
) -> Result<Json<ApiResponse<Vec<ChecklistEntryDto>>>, AppError> {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!("Invalid month: {}", month)));
        }
    }

    let (entries, total) = state
        .submissions
        .list(query.month, query.year, query.offset(), query.limit())
        .await?;

    let dtos: Vec<ChecklistEntryDto> = entries
        .iter()
        .map(|e| ChecklistEntryDto::from_entry(e, &state.fraud_policy))
        .collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get a single checklist entry
#[utoipa::path(
    get,
    path = "/api/checklist/{id}",
    tag = "checklist",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry detail", body = ApiResponse<ChecklistEntryDto>),
        (status = 404, description = "Entry not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_entry(
    _user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ChecklistEntryDto>>, AppError> {
    let entry = state.submissions.get_by_id(id).await?;
    let dto = ChecklistEntryDto::from_entry(&entry, &state.fraud_policy);
    Ok(Json(ApiResponse::success(Some(dto), None, None)))
}

/// Approve an entry (supervisor only)
#[utoipa::path(
    patch,
    path = "/api/checklist/{id}/approve",
    tag = "checklist",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry approved", body = ApiResponse<ChecklistEntryDto>),
        (status = 403, description = "Supervisor access required"),
        (status = 404, description = "Entry not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_entry(
    user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ChecklistEntryDto>>, AppError> {
    if !user.has_supervisor_access() {
        return Err(AppError::Forbidden(
            "Supervisor access required".to_string(),
        ));
    }

    let entry = state.submissions.approve(id, &user.account_id).await?;
    let dto = ChecklistEntryDto::from_entry(&entry, &state.fraud_policy);
    Ok(Json(ApiResponse::success(Some(dto), None, None)))
}

/// Delete an entry (super admin only)
#[utoipa::path(
    delete,
    path = "/api/checklist/{id}",
    tag = "checklist",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 403, description = "Super admin access required"),
        (status = 404, description = "Entry not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_entry(
    user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !user.is_super_admin() {
        return Err(AppError::Forbidden(
            "Super admin access required".to_string(),
        ));
    }

    state.submissions.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Entry deleted".to_string()),
        None,
    )))
}

/// Subscribe to entry change events (SSE)
#[utoipa::path(
    get,
    path = "/api/checklist/feed",
    tag = "checklist",
    responses(
        (status = 200, description = "Server-sent entry change events"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn feed_events(
    _user: AuthenticatedUser,
    State(state): State<ChecklistState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.feed.subscribe();

    let stream = BroadcastStream::new(receiver)
        .filter_map(|message| message.ok())
        .map(|event| {
            Event::default()
                .event("entry_change")
                .json_data(&event)
                .map_err(axum::Error::new)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================================
// Expected locations (reference data behind GPS validation)
// ============================================================================

/// List configured expected locations (supervisor only)
#[utoipa::path(
    get,
    path = "/api/expected-locations",
    tag = "checklist",
    responses(
        (status = 200, description = "Expected locations", body = ApiResponse<Vec<ExpectedLocationDto>>),
        (status = 403, description = "Supervisor access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_expected_locations(
    user: AuthenticatedUser,
    State(state): State<ChecklistState>,
) -> Result<Json<ApiResponse<Vec<ExpectedLocationDto>>>, AppError> {
    if !user.has_supervisor_access() {
        return Err(AppError::Forbidden(
            "Supervisor access required".to_string(),
        ));
    }

    let references = state.expected_locations.list().await?;
    let dtos: Vec<ExpectedLocationDto> = references.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(Some(dtos), None, None)))
}

/// Create or replace an expected location (supervisor only)
#[utoipa::path(
    put,
    path = "/api/expected-locations",
    tag = "checklist",
    request_body = UpsertExpectedLocationDto,
    responses(
        (status = 200, description = "Reference stored", body = ApiResponse<ExpectedLocationDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Supervisor access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upsert_expected_location(
    user: AuthenticatedUser,
    State(state): State<ChecklistState>,
    AppJson(payload): AppJson<UpsertExpectedLocationDto>,
) -> Result<Json<ApiResponse<ExpectedLocationDto>>, AppError> {
    if !user.has_supervisor_access() {
        return Err(AppError::Forbidden(
            "Supervisor access required".to_string(),
        ));
    }

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reference = state.expected_locations.upsert(&payload).await?;
    Ok(Json(ApiResponse::success(
        Some(reference.into()),
        None,
        None,
    )))
}

// ============================================================================
// Multipart helpers
// ============================================================================

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or("field").to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

async fn read_int(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<i32, AppError> {
    read_text(field)
        .await?
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))
}

async fn read_float(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<f64, AppError> {
    read_text(field)
        .await?
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("{} must be a number", name)))
}
