use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::analysis::{
    AnalysisError, AnalysisRequest, AnalysisSummary, JobState, ScanParams, ScanWindow,
};
use crate::catalog::Scope;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StartResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub is_running: bool,
    /// 0..100.
    pub progress: u8,
    /// Embeds a "<processed>/<total> pairs" fragment while a run is active.
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/start-analysis",
    responses(
        (status = 202, description = "Analysis started", body = StartResponse),
        (status = 400, description = "No user satellites uploaded", body = ErrorResponse),
        (status = 409, description = "Analysis already running", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn start_analysis(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (user, catalog) = {
        let store = state.store.read().await;
        let user: Vec<_> = store.list(Scope::User).into_iter().cloned().collect();
        let mut catalog: Vec<_> = store.list(Scope::Catalog).into_iter().cloned().collect();
        if let Some(limit) = state.config.analysis.catalog_limit {
            catalog.truncate(limit);
        }
        (user, catalog)
    };

    if user.is_empty() {
        return Err(ApiError::Validation(
            "no user satellites uploaded".to_string(),
        ));
    }

    let request = AnalysisRequest {
        user,
        catalog,
        model_path: state.config.model.path.clone(),
        params: scan_params(&state),
        results_path: Some(state.config.data.results.clone()),
    };

    let mut controller = state.controller.lock().await;
    controller.start(request).map_err(|e| match e {
        AnalysisError::Busy => ApiError::Busy,
        AnalysisError::NonPositiveStep => ApiError::Validation(e.to_string()),
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            status: "analysis started".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/stop-analysis",
    responses(
        (status = 200, description = "Cancellation requested", body = StartResponse)
    ),
    tag = "analysis"
)]
pub async fn stop_analysis(State(state): State<AppState>) -> Json<StartResponse> {
    let mut controller = state.controller.lock().await;
    let status = match controller.stop().await {
        JobState::Cancelled => {
            // A stopped run leaves the controller ready for the next start,
            // indistinguishable from a fresh process.
            controller.reset();
            "analysis cancelled"
        }
        // The worker finished before the stop request landed.
        JobState::Completed => "analysis already complete",
        JobState::Failed => "analysis already failed",
        JobState::Idle => "no analysis running",
        JobState::Running => "analysis stopping",
    };
    Json(StartResponse {
        status: status.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/analysis-status",
    responses(
        (status = 200, description = "Job status snapshot", body = StatusResponse)
    ),
    tag = "analysis"
)]
pub async fn analysis_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let controller = state.controller.lock().await;
    let status = controller.status();
    Json(StatusResponse {
        is_running: status.state == JobState::Running,
        progress: status.progress_percent,
        message: status.message,
    })
}

#[utoipa::path(
    get,
    path = "/api/analysis-results",
    responses(
        (status = 200, description = "Latest completed run", body = AnalysisSummary),
        (status = 404, description = "No completed run yet", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn analysis_results(State(state): State<AppState>) -> ApiResult<Json<AnalysisSummary>> {
    let controller = state.controller.lock().await;
    controller
        .summary()
        .map(Json)
        .ok_or(ApiError::NoResults("no completed analysis run"))
}

fn scan_params(state: &AppState) -> ScanParams {
    let analysis = &state.config.analysis;
    let start = Utc::now();
    let window = Duration::from_std(analysis.window).unwrap_or_else(|_| Duration::hours(48));
    let coarse_step =
        Duration::from_std(analysis.coarse_step).unwrap_or_else(|_| Duration::hours(1));
    let fine_step =
        Duration::from_std(analysis.fine_step).unwrap_or_else(|_| Duration::seconds(60));
    ScanParams {
        window: ScanWindow {
            start,
            end: start + window,
        },
        coarse_step,
        fine_step,
        threshold_km: analysis.threshold_km,
    }
}
