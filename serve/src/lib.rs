//! HTTP façade for tog (axum + SSE).
//!
//! Routes: `GET /chat?prompt=` streams one reasoning run's log lines as SSE
//! and closes with the `RunRecord` JSON and a `[DONE]` sentinel;
//! `GET|PUT /config` reads/replaces the run settings; `POST /reset-oracle`
//! clears the oracle's conversational context.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod chat;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use app::{router, state_from_env};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runs the server on an existing listener. Used by tests (bind to
/// 127.0.0.1:0 first, then pass the listener). When `once` is true, serves a
/// single chat run and then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("tog server listening on http://{}", addr);
    if once {
        info!("will exit after the first chat run is done (once mode, used by tests)");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = Arc::new(state_from_env(if once { Some(shutdown_tx) } else { None })?);
    let app = router(state);

    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("chat run done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the server. Listens on `addr` (default 127.0.0.1:8080). When `once`
/// is true, serves one chat run, then returns (process exits).
pub async fn run_serve(
    addr: Option<&str>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, once).await
}
