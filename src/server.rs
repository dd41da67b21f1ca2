use crate::config::{AppConfig, SheetBackend};
use crate::intake::IntakeHandler;
use crate::sheets::{GoogleSheetsConfig, GoogleSheetsStore, JsonlSheet, MemorySheet, SheetStore};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub intake: IntakeHandler,
}

impl AppState {
    pub fn new(config: AppConfig, intake: IntakeHandler) -> Self {
        Self {
            config: Arc::new(config),
            intake,
        }
    }
}

/// Builds the sheet backend selected by the config.
pub fn sheet_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn SheetStore>> {
    let sheet: Arc<dyn SheetStore> = match config.sheet_backend {
        SheetBackend::Memory => {
            tracing::warn!("using in-memory sheet; rows are lost on shutdown");
            Arc::new(MemorySheet::default())
        }
        SheetBackend::File => {
            tracing::info!(path = %config.sheet_file.display(), "using file sheet");
            Arc::new(JsonlSheet::new(config.sheet_file.clone()))
        }
        SheetBackend::Google => {
            let access_token = config
                .sheets_access_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SHEETS_ACCESS_TOKEN not set"))?;
            tracing::info!(spreadsheet = %config.spreadsheet_id, "using google sheets");
            Arc::new(GoogleSheetsStore::new(GoogleSheetsConfig {
                api_base: config.sheets_api_base.clone(),
                spreadsheet_id: config.spreadsheet_id.clone(),
                range: config.sheet_range.clone(),
                access_token,
                timeout: config.request_timeout(),
            })?)
        }
    };
    Ok(sheet)
}

pub fn router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;
    let router = Router::new()
        .route(
            "/intake",
            post(crate::api::post_intake).layer(DefaultBodyLimit::disable()),
        )
        .route("/widget.js", get(crate::api::serve_widget_script))
        .route("/healthz", get(crate::api::healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http());
    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "intake service listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
