use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use service::intro_source::SharePointListClient;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes;
use crate::state::WebPartState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config file (`CONFIG_PATH` or config.toml) when present, otherwise environment variables.
/// A file that exists but is invalid is an error, never silently replaced by the environment.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = configs::config_path();
    match AppConfig::load_if_present(&path)? {
        Some(cfg) => {
            info!(path = %path, "loaded config file");
            Ok(cfg)
        }
        None => {
            warn!(path = %path, "no config file; using environment variables");
            AppConfig::from_env()
        }
    }
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Build the web part app against the configured SharePoint site
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let client = SharePointListClient::from_config(&cfg.sharepoint)?;
    let state = WebPartState::new(Arc::new(client));
    Ok(routes::build_router(state, build_cors()))
}

/// Serve `app` until `shutdown` resolves, letting in-flight actions finish their SharePoint calls.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, draining in-flight actions");
}

/// Run the web part with an already loaded config until Ctrl+C.
pub async fn run_with(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;
    let addr = bind_addr(&cfg)?;
    info!(%addr, site = %cfg.sharepoint.site_url, "starting web part server");
    let listener = TcpListener::bind(addr).await?;
    serve(listener, app, ctrl_c()).await?;
    info!("web part server stopped");
    Ok(())
}
