//! # POSNET Bridge daemon
//!
//! Binds `127.0.0.1:<POSNET_BRIDGE_PORT>` and spools fiscal requests from
//! the PMS to `FISCAL_POSNET_SPOOL_DIR`. Runs until Ctrl-C or SIGTERM;
//! in-flight requests are allowed to finish their spool write.

use anyhow::Context;
use posnet_bridge::config::BridgeConfig;
use posnet_bridge::create_app;
use posnet_bridge::state::AppState;
use tracing::{info, warn};

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "status"),
    ("POST", "/fiscal/print", "receipt"),
    ("POST", "/fiscal/invoice", "invoice"),
    ("POST", "/fiscal/report/x", "X report"),
    ("POST", "/fiscal/report/z", "Z report"),
    ("POST", "/fiscal/report/periodic", "periodic report"),
    ("POST", "/fiscal/storno", "storno"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posnet_bridge=info,tower_http=info".into()),
        )
        .init();

    let config = BridgeConfig::from_env().context("invalid bridge configuration")?;

    if let Err(e) = tokio::fs::create_dir_all(&config.spool_dir).await {
        warn!(
            "cannot create spool dir {} yet, will retry on first write: {}",
            config.spool_dir.display(),
            e
        );
    }
    if config.api_key.is_none() {
        warn!("no API key configured, fiscal endpoints are open to any local caller");
    }

    let addr = config.bind_addr();
    let state = AppState::new(&config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;

    info!(
        "POSNET bridge v{} listening on http://{}",
        env!("CARGO_PKG_VERSION"),
        addr
    );
    for (method, path, what) in ENDPOINTS {
        info!("  {:<5} {:<24} {}", method, path, what);
    }
    info!("spool dir: {}", config.spool_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("POSNET bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
