use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::log_store::LogQuery;
use crate::service::{
    CompleteUndockingRequest, PlaceRequest, PlacementRequest, PlacementResponse,
    ReturnPlanRequest, ReturnPlanResponse, RetrieveRequest, SearchQuery, SearchResponse,
    SimulateDayRequest, SimulateDayResponse,
};

const UPLOAD_FIELD: &str = "file";

/// Decode a JSON body. A missing, unreadable, `null` or `{}` body is treated
/// as "no data" and rejected with 400.
fn payload<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = body.map_err(|_| ApiError::no_data())?;
    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ApiError::no_data());
    }
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("Invalid data: {e}")))
}

/// Bytes of the `file` part of a multipart upload.
async fn upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Bytes, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file part"))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }
        return field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()));
    }
    Err(ApiError::bad_request("No file part"))
}

pub(super) async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stowage = state.lock();
    Ok(Json(json!({
        "success": true,
        "items": stowage.items().len(),
        "containers": stowage.containers().len(),
        "logEntries": stowage.log().len(),
    })))
}

pub(super) async fn placement(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PlacementResponse>, ApiError> {
    let request: PlacementRequest = payload(body)?;
    Ok(Json(state.lock().place_items(request)))
}

pub(super) async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    Ok(Json(state.lock().search(query)))
}

pub(super) async fn retrieve(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request: RetrieveRequest = payload(body)?;
    state.lock().retrieve(request)?;
    Ok(Json(json!({ "success": true })))
}

pub(super) async fn place(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request: PlaceRequest = payload(body)?;
    state.lock().place(request)?;
    Ok(Json(json!({ "success": true })))
}

pub(super) async fn identify_waste(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let waste_items = state.lock().identify_waste();
    Ok(Json(json!({ "success": true, "wasteItems": waste_items })))
}

pub(super) async fn return_plan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ReturnPlanResponse>, ApiError> {
    let request: ReturnPlanRequest = payload(body)?;
    Ok(Json(state.lock().return_plan(request)))
}

pub(super) async fn complete_undocking(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request: CompleteUndockingRequest = payload(body)?;
    let removed = state.lock().complete_undocking(request);
    Ok(Json(json!({ "success": true, "itemsRemoved": removed })))
}

pub(super) async fn simulate_day(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SimulateDayResponse>, ApiError> {
    let request: SimulateDayRequest = payload(body)?;
    Ok(Json(state.lock().simulate_day(request)?))
}

pub(super) async fn import_items(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let bytes = upload(multipart).await?;
    let report = state.lock().import_items(bytes.as_ref())?;
    Ok(Json(json!({
        "success": true,
        "itemsImported": report.imported(),
        "errors": report.errors,
    })))
}

pub(super) async fn import_containers(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let bytes = upload(multipart).await?;
    let report = state.lock().import_containers(bytes.as_ref())?;
    Ok(Json(json!({
        "success": true,
        "containersImported": report.imported(),
        "errors": report.errors,
    })))
}

pub(super) async fn export_arrangement(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state.lock().export_arrangement()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=arrangement.csv",
            ),
        ],
        csv,
    ))
}

pub(super) async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Value>, ApiError> {
    let logs = state.lock().logs(&query);
    Ok(Json(json!({ "success": true, "logs": logs })))
}
