use anyhow::{Context, Result};
use cert_agent::infrastructure::config::AppConfig;
use cert_agent::infrastructure::logging::init_logging;
use cert_agent::infrastructure::process::SystemCommandRunner;
use cert_agent::infrastructure::public_ip::discover_public_ip;
use cert_agent::infrastructure::singleton::{enforce_singleton, PgrepProcessTable};
use cert_agent::interface::http::router;
use cert_agent::runtime::{build_app, shutdown_signal};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

fn main() -> Result<()> {
    // Runs before the tokio runtime and the log sink start.
    let singleton = enforce_singleton(&PgrepProcessTable::for_current_process(), std::process::id());

    let config = AppConfig::from_env();
    let logging_runtime = init_logging(&config)?;
    info!(
        base_dir = %config.base_dir.display(),
        config_file = %config.config_path.display(),
        log_file = %logging_runtime.log_file.display(),
        log_level = %config.log_level,
        retention_days = config.log_retention_days,
        "cert-agent logging initialized"
    );
    singleton.log();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(serve(config))?;

    drop(logging_runtime);
    Ok(())
}

async fn serve(config: AppConfig) -> Result<()> {
    let state = build_app(&config, Arc::new(SystemCommandRunner::new())).await?;
    let _scheduler = state.scheduler.spawn();

    let initial = state.config.get().await;
    info!(config_file = %config.config_path.display(), ip_addr = %initial.ip_addr, "config loaded");

    if !initial.web_enable {
        info!("control API disabled");
        shutdown_signal().await;
        info!("cert-agent shutting down");
        return Ok(());
    }

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind control API on {addr}"))?;
    let public_ip = discover_public_ip(&config.public_ip_url)
        .await
        .unwrap_or_else(|| "unknown".to_string());
    info!(
        address = %addr,
        control_page = %format!("http://{}:{}", public_ip, config.port),
        "cert-agent control API listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("cert-agent shutting down");
    Ok(())
}
