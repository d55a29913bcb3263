//! callgate gateway binary.
//!
//! - Loads the strict YAML config (`CALLGATE_CONFIG`, default `callgate.yaml`)
//! - Registers the built-in operations
//! - Serves `POST /v1/call` until SIGINT/SIGTERM, then drains

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use callgate_core::error::{GateError, Result};
use callgate_gateway::{
    app_state::{AppState, Backends},
    auth::{MemoryRevocations, MemorySessionStore},
    config,
    dispatch::HandlerRegistry,
    router, services,
};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| GateError::Internal(format!("gateway.listen: {e}")))?;

    let mut registry = HandlerRegistry::new();
    services::register_builtins(&mut registry)?;

    // In-process stores; production wires its own SessionStore/RevocationSource.
    let backends = Backends {
        sessions: Some(Arc::new(MemorySessionStore::new())),
        revocations: Some(Arc::new(MemoryRevocations::new())),
    };

    let state = AppState::new(cfg, registry, backends)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "callgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| GateError::Internal(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| GateError::Internal(format!("server failed: {e}")))?;

    tracing::info!("callgate-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    state.metrics().set_draining();
    tracing::info!("signal received, starting graceful shutdown");
}
