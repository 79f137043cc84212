use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::cache::{CacheClient, RedisCache};
use crate::config::{Config, DRAIN_TIMEOUT, STATS_INTERVAL};
use crate::db::{ArticleClient, MySqlArticles};
use crate::error::TandemError;
use crate::router::{TandemState, tandem_router};
use crate::service::backoff::{LinearBuilder, Probe, connect_with_backoff};
use crate::service::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight request finished and the listener stopped.
    Drained,
    /// The drain deadline passed first; shutdown continues regardless.
    DeadlineElapsed,
}

/// Bring up the relational store, then the cache. Either failing is fatal.
pub async fn connect_stores(cfg: &Config) -> Result<TandemState, TandemError> {
    let policy = LinearBuilder::default();
    info!(attempts = policy.max_attempts(), "establishing store connections");

    let mysql = connect_with_backoff("mysql", policy, || MySqlArticles::open(cfg)).await?;
    let redis = match connect_with_backoff("redis", policy, || RedisCache::open(cfg)).await {
        Ok(redis) => redis,
        Err(e) => {
            mysql.close().await;
            return Err(e);
        }
    };

    Ok(TandemState::new(
        ArticleClient::new(Arc::new(mysql)),
        CacheClient::new(Arc::new(redis)),
    ))
}

/// Serve `app` on a background task until `shutdown` resolves, then stop
/// accepting and give in-flight requests up to `drain` to finish.
pub async fn serve_with_drain<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain: Duration,
) -> Result<DrainOutcome, TandemError>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });
    info!(%addr, "HTTP server listening");

    shutdown.await;
    info!("shutdown requested; draining in-flight requests");
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => Ok(DrainOutcome::Drained),
        Ok(Ok(Err(e))) => {
            error!(error = %e, "HTTP server exited with error");
            Err(e.into())
        }
        Ok(Err(join_err)) => {
            error!(error = %join_err, "HTTP server task failed");
            Ok(DrainOutcome::Drained)
        }
        Err(_) => {
            warn!(deadline = ?drain, "drain deadline elapsed with requests still in flight");
            Ok(DrainOutcome::DeadlineElapsed)
        }
    }
}

/// Full process lifecycle: connect, report, serve, drain, close.
pub async fn run(cfg: Config) -> Result<(), TandemError> {
    info!("starting tandem service");

    let state = connect_stores(&cfg).await.inspect_err(|e| {
        error!(error = %e, "failed to initialise stores");
    })?;

    let reporter = stats::spawn(state.clone(), STATS_INTERVAL);

    let listener = match TcpListener::bind(&cfg.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %cfg.listen_addr, error = %e, "failed to bind listener");
            reporter.abort();
            close_stores(&state).await;
            return Err(e.into());
        }
    };

    let app = tandem_router(state.clone());
    let outcome = serve_with_drain(listener, app, shutdown_signal(), DRAIN_TIMEOUT).await;

    reporter.abort();
    close_stores(&state).await;

    let outcome = outcome?;
    info!(?outcome, "shutdown complete");
    Ok(())
}

async fn close_stores(state: &TandemState) {
    state.articles.close().await;
    state.cache.close().await;
    info!("store connections closed");
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
