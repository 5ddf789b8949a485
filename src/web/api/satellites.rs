use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::{save_records, Scope, TleRecord};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteListResponse {
    pub satellites: Vec<TleRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadTleRequest {
    pub name: String,
    pub tle1: String,
    pub tle2: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadTleResponse {
    pub status: String,
    /// The registered name, suffixed if the upload collided with an
    /// existing one.
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    responses(
        (status = 200, description = "User and catalog satellites", body = SatelliteListResponse)
    ),
    tag = "satellites"
)]
pub async fn list_satellites(State(state): State<AppState>) -> Json<SatelliteListResponse> {
    let store = state.store.read().await;
    Json(SatelliteListResponse {
        satellites: store.records(Scope::All),
    })
}

#[utoipa::path(
    post,
    path = "/api/upload-tle",
    request_body = UploadTleRequest,
    responses(
        (status = 200, description = "TLE accepted", body = UploadTleResponse),
        (status = 400, description = "TLE rejected", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn upload_tle(
    State(state): State<AppState>,
    Json(request): Json<UploadTleRequest>,
) -> ApiResult<Json<UploadTleResponse>> {
    let mut store = state.store.write().await;
    let satellite = store
        .ingest_user(&request.name, &request.tle1, &request.tle2)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let records = store.records(Scope::User);
    save_records(&state.config.data.user_tle, &records)
        .map_err(|e| ApiError::Internal(format!("failed to persist user TLEs: {e}")))?;

    Ok(Json(UploadTleResponse {
        status: "TLE data uploaded successfully".to_string(),
        name: satellite.name,
    }))
}
