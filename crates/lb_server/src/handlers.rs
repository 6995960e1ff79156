//! Route handlers.  Record bodies are ciphertext; the server never looks
//! inside `opaque` or `meta`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use lb_proto::{Record, RecordType, Records, StatusResponse, User};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<User>, JsonRejection>,
) -> ApiResult<StatusResponse> {
    let Json(user) = body?;
    let id = state
        .store
        .add_user(&user)
        .await
        .map_err(|e| ApiError::from(e).named(&user.name))?;
    info!(user = %user.name, id, "registered");
    Ok(Json(StatusResponse::ok(user.name, id)))
}

pub async fn ping(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<StatusResponse> {
    Json(StatusResponse::ok(user, 0))
}

pub async fn store_record(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<Record>, JsonRejection>,
) -> ApiResult<StatusResponse> {
    let Json(record) = body?;
    let id = state
        .store
        .store_record(&user, &record)
        .await
        .map_err(|e| ApiError::from(e).named(&record.name))?;
    info!(user = %user, id, record_type = %record.record_type, "record stored");
    Ok(Json(StatusResponse::ok(record.name, id)))
}

pub async fn list_records(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Records> {
    Ok(Json(state.store.list_records(&user).await?))
}

pub async fn list_records_by_type(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(record_type): Path<String>,
) -> ApiResult<Records> {
    let record_type = parse_type(&record_type)?;
    Ok(Json(
        state.store.list_records_by_type(&user, record_type).await?,
    ))
}

pub async fn get_record(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get_record_by_id(&user, id).await?))
}

pub async fn update_record(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Record>, JsonRejection>,
) -> ApiResult<StatusResponse> {
    let id = parse_id(&id)?;
    let Json(record) = body?;
    state
        .store
        .update_record_by_id(&user, id, &record)
        .await
        .map_err(|e| ApiError::from(e).named(&record.name))?;
    info!(user = %user, id, "record updated");
    Ok(Json(StatusResponse::ok(record.name, id)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusResponse> {
    let id = parse_id(&id)?;
    state.store.delete_record_by_id(&user, id).await?;
    info!(user = %user, id, "record deleted");
    Ok(Json(StatusResponse::ok(String::new(), id)))
}

pub async fn get_record_by_name(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((record_type, name)): Path<(String, String)>,
) -> ApiResult<Record> {
    let record_type = parse_type(&record_type)?;
    Ok(Json(
        state
            .store
            .get_record_by_type_name(&user, record_type, &name)
            .await?,
    ))
}

pub async fn update_record_by_name(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((record_type, name)): Path<(String, String)>,
    body: Result<Json<Record>, JsonRejection>,
) -> ApiResult<StatusResponse> {
    let record_type = parse_type(&record_type)?;
    let Json(record) = body?;
    let id = state
        .store
        .update_record_by_type_name(&user, record_type, &name, &record)
        .await
        .map_err(|e| ApiError::from(e).named(&name))?;
    info!(user = %user, id, "record updated");
    Ok(Json(StatusResponse::ok(record.name, id)))
}

pub async fn delete_record_by_name(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((record_type, name)): Path<(String, String)>,
) -> ApiResult<StatusResponse> {
    let record_type = parse_type(&record_type)?;
    let id = state
        .store
        .delete_record_by_type_name(&user, record_type, &name)
        .await
        .map_err(|e| ApiError::from(e).named(&name))?;
    info!(user = %user, id, "record deleted");
    Ok(Json(StatusResponse::ok(name, id)))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Bad Record Id: {raw}")))
}

fn parse_type(raw: &str) -> Result<RecordType, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown Record Type: {raw}")))
}
