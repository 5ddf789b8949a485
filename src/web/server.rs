use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::AnalysisController;
use crate::catalog::{load_records, TleStore};

use super::api::{analysis, satellites};
use super::api_doc::ApiDoc;
use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<RwLock<TleStore>>,
    pub controller: Arc<Mutex<AnalysisController>>,
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let mut store = TleStore::new();
    match load_records(&config.data.catalog) {
        Ok(records) => {
            store.ingest_catalog(records);
        }
        Err(e) => log::warn!(
            "catalog {} not loaded: {} (run fetch-catalog first)",
            config.data.catalog.display(),
            e
        ),
    }
    match load_records(&config.data.user_tle) {
        Ok(records) => {
            for record in records {
                if let Err(e) = store.ingest_user(&record.name, &record.tle1, &record.tle2) {
                    log::warn!("stored user TLE '{}' rejected: {}", record.name, e);
                }
            }
        }
        Err(e) => log::info!("no stored user TLEs: {e}"),
    }

    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(store)),
        controller: Arc::new(Mutex::new(AnalysisController::new())),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/start-analysis", post(analysis::start_analysis))
        .route("/api/stop-analysis", post(analysis::stop_analysis))
        .route("/api/analysis-status", get(analysis::analysis_status))
        .route("/api/analysis-results", get(analysis::analysis_results))
        .route("/api/satellites", get(satellites::list_satellites))
        .route("/api/upload-tle", post(satellites::upload_tle))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
