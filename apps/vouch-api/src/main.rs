//! vouch API server.
//!
//! Wires the passwordless verification engines to in-memory collaborators,
//! serves the passwordless router, and sweeps expired state in the background.

mod config;
mod logging;

use axum::Router;
use chrono::Utc;
use config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use vouch_api_passwordless::{passwordless_router, PasswordlessState};
use vouch_core::SystemClock;
use vouch_csrf::CsrfTokenService;
use vouch_verification::memory::{
    InMemoryAuditSink, InMemoryCodeRepository, InMemorySessionStore, InMemoryUserDirectory,
    LogNotifier, SessionTtl, SlidingWindowRateLimiter,
};
use vouch_verification::{
    ChannelKind, CodeVerificationEngine, EngineCollaborators, EngineRegistry, OsEntropy,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// How often stale rate-limit windows, dead codes and expired sessions are swept.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        env = %config.app_env,
        csrf_enforce = config.csrf_enforce,
        "Starting vouch API"
    );

    match config.validate_security_config() {
        Ok(warnings) => {
            for warning in &warnings {
                tracing::warn!(target: "security", "{}", warning);
            }
        }
        Err(errors) => {
            for error in &errors {
                tracing::error!(target: "security", "{}", error);
            }
            eprintln!(
                "FATAL: {} insecure setting(s) detected in production mode. \
                 Set CSRF_SECRET and disable DEV_EXPOSE_SECRET, or use APP_ENV=development.",
                errors.len()
            );
            std::process::exit(1);
        }
    }

    let codes = Arc::new(InMemoryCodeRepository::new());
    let sessions = Arc::new(InMemorySessionStore::new(SessionTtl::default()));
    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(config.rate_limit_config()));

    let deps = EngineCollaborators {
        codes: codes.clone(),
        users: Arc::new(InMemoryUserDirectory::new()),
        sessions: sessions.clone(),
        audit: Arc::new(InMemoryAuditSink::new()),
        notifier: Arc::new(LogNotifier::new(config.magic_link_base_url.clone())),
        rate_limiter: rate_limiter.clone(),
        entropy: Arc::new(OsEntropy),
        clock: Arc::new(SystemClock),
    };

    let mut registry = EngineRegistry::new();
    for channel in ChannelKind::ALL {
        match CodeVerificationEngine::new(channel, config.engine_config(channel), deps.clone()) {
            Ok(engine) => {
                registry.register(engine);
            }
            Err(e) => {
                eprintln!("Error: invalid {channel} configuration: {e}");
                std::process::exit(1);
            }
        }
    }

    let csrf = match config.csrf_secret {
        Some(secret) => CsrfTokenService::with_secret(config.csrf_config(), secret),
        None => CsrfTokenService::new(config.csrf_config()),
    };
    let csrf = match csrf {
        Ok(service) => Arc::new(service),
        Err(e) => {
            eprintln!("Error: invalid CSRF configuration: {e}");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();

    let state = PasswordlessState::new(registry, csrf.clone(), config.api_settings())
        .with_shutdown(shutdown.clone());
    let app: Router = passwordless_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    {
        let csrf = csrf.clone();
        spawn_periodic(
            "csrf_cleanup",
            Duration::from_secs(config.csrf_cleanup_interval_secs),
            shutdown.clone(),
            move || {
                let removed = csrf.cleanup_expired_tokens();
                if removed > 0 {
                    tracing::info!(target: "csrf", removed, "Cleaned up expired CSRF tokens");
                }
            },
        );
    }

    spawn_periodic(
        "maintenance",
        MAINTENANCE_INTERVAL,
        shutdown.clone(),
        move || {
            let keys = rate_limiter.cleanup();
            let purged = codes.purge(Utc::now());
            let expired_sessions = sessions.purge_expired();
            if keys > 0 || purged > 0 || expired_sessions > 0 {
                tracing::debug!(
                    target: "verification",
                    rate_limit_keys = keys,
                    codes = purged,
                    sessions = expired_sessions,
                    "Swept stale verification state"
                );
            }
        },
    );

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid bind address '{}': {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!(%addr, "Server listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Run `task` every `interval` until `shutdown` is cancelled.
fn spawn_periodic<F>(name: &'static str, interval: Duration, shutdown: CancellationToken, task: F)
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::debug!(task = name, "Background task stopped");
                    break;
                }
                _ = ticker.tick() => task(),
            }
        }
    });
}

/// Wait for Ctrl+C or SIGTERM, then cancel background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }

    shutdown.cancel();
}
