use utoipa::OpenApi;

use super::api::analysis::{StartResponse, StatusResponse};
use super::api::error::ErrorResponse;
use super::api::satellites::{SatelliteListResponse, UploadTleRequest, UploadTleResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::analysis::start_analysis,
        super::api::analysis::stop_analysis,
        super::api::analysis::analysis_status,
        super::api::analysis::analysis_results,
        super::api::satellites::list_satellites,
        super::api::satellites::upload_tle,
    ),
    components(
        schemas(
            StartResponse,
            StatusResponse,
            ErrorResponse,
            SatelliteListResponse,
            UploadTleRequest,
            UploadTleResponse,
            crate::analysis::AnalysisSummary,
            crate::analysis::ConjunctionCandidate,
            crate::analysis::RiskLevel,
            crate::catalog::TleRecord,
        )
    ),
    info(
        title = "Conjunction Watch API",
        description = "Close-approach prediction between uploaded satellites and the reference catalog",
        version = "0.1.0"
    ),
    tags(
        (name = "analysis", description = "Conjunction analysis job"),
        (name = "satellites", description = "TLE ingestion and listing")
    )
)]
pub struct ApiDoc;
