use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::auth::{OptionalSessionUser, SessionUser};
use crate::models::{CreateEventRequest, FilePart, Member, NearbyQuery};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

const FILE_FIELD: &str = "file";

fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::ValidationError(format!("'{}' is not a valid event id", raw)))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::ValidationError("The uploaded file exceeds the size limit".to_string())
    } else {
        AppError::ValidationError(format!("Malformed multipart body: {}", e.body_text()))
    }
}

/// First part named `file`, other fields are skipped.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<FilePart>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(FilePart {
            file_name,
            content_type,
            data,
        }));
    }
    Ok(None)
}

/// GET /events/public
pub async fn list_public_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.events.list_public_events().await?;
    Ok(success(events, "Public events retrieved"))
}

/// GET /events/closeby?lat=&lon=&radius_km=
pub async fn list_nearby_events(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let events = state.events.list_nearby_events(&query).await?;
    Ok(success(events, "Nearby events retrieved"))
}

/// GET /events/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&id)?;
    let members: Vec<Member> = state
        .events
        .list_members(event_id)
        .await?
        .into_iter()
        .map(Member::from)
        .collect();
    Ok(success(members, "Event members retrieved"))
}

/// GET /events/:id/assets
pub async fn list_assets(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&id)?;
    let assets = state.events.list_assets(event_id, &user).await?;
    Ok(success(assets, "Event assets retrieved"))
}

/// POST /events/:id/upload, multipart with a `file` field
///
/// The caller is resolved inside the service, after the event lookup.
pub async fn upload_asset(
    State(state): State<AppState>,
    OptionalSessionUser(user): OptionalSessionUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&id)?;
    let multipart = multipart.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let part = read_file_part(multipart).await?;

    let asset = state
        .events
        .upload_asset(event_id, user.as_ref(), part)
        .await?;
    Ok(created(asset, "Asset uploaded"))
}

/// POST /events/:id/join
pub async fn join_event(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&id)?;
    let event = state.events.join(event_id, &user).await?;
    Ok(success(event, "Joined event"))
}

/// POST /events/create
pub async fn create_event(
    State(state): State<AppState>,
    OptionalSessionUser(user): OptionalSessionUser,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let creator = user.ok_or_else(|| {
        AppError::ValidationError("An authenticated user is required to create events".to_string())
    })?;

    let event = state.events.create_event(&creator, request).await?;
    Ok(created(event, "Event created"))
}
