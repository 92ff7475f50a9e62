use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn main() -> ExitCode {
    // .env first so RUST_LOG / LOG_FORMAT and the SharePoint variables take effect
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let instance_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "web_part", event = "panic", %instance_id, message = %info, "unhandled panic occurred");
    }));

    let cfg = match server::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "web_part", event = "config_invalid", error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = cfg.server.worker_threads {
        builder.worker_threads(threads);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "web_part", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "web_part",
        event = "start",
        %instance_id,
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        site = %cfg.sharepoint.site_url,
        "claas intro source web part starting"
    );

    match rt.block_on(server::run_with(cfg)) {
        Ok(()) => {
            info!(service = "web_part", event = "stop", %instance_id, "web part stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "web_part", event = "run_failed", error = %e, "web part server failed");
            ExitCode::FAILURE
        }
    }
}
