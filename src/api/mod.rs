//! REST API (Axum)
//!
//! Routes:
//! - `GET /` liveness message
//! - `GET /companies` fixed company list
//! - `GET /data/:symbol` last records with derived metrics
//! - `GET /summary/:symbol` 52-week summary
//! - `GET /compare?symbol1=..&symbol2=..` mean daily return comparison

pub mod error;
pub mod handlers;

use crate::services::StockService;
use axum::{routing::get, Router};
use log::info;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Application state shared across handlers
pub struct AppState {
    pub service: StockService,
}

impl AppState {
    pub fn new(service: StockService) -> Self {
        Self { service }
    }
}

/// Any origin, method and header, with credentials.
///
/// Wildcards cannot be combined with credentials, so the request's own
/// values are mirrored back instead.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/companies", get(handlers::list_companies))
        .route("/data/:symbol", get(handlers::get_stock_data))
        .route("/summary/:symbol", get(handlers::get_stock_summary))
        .route("/compare", get(handlers::compare))
        .layer(cors_layer())
        .with_state(state)
}

/// Run the API server until the process is stopped
pub async fn run_server(service: StockService) -> anyhow::Result<()> {
    let addr = service.config().bind_addr.clone();
    let app = build_router(Arc::new(AppState::new(service)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Stock data API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
