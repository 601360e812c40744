// Hackhub API - Local Development Server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use hackhub_app::{spawn_rate_limit_cleanup, AppServices, CounterBackend};
use hackhub_auth::AuthConfig;
use hackhub_common::{config::Config, Clock, SystemClock};
use hackhub_ratelimit::RateLimitPolicy;
use hackhub_store::MemoryStore;
use hackhub_teams::TeamRules;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .pretty()
        .init();

    info!("Starting Hackhub API local development server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let rules = TeamRules::from_env().map_err(|e| {
        error!("Invalid team rules: {}", e);
        e
    })?;
    let policy = RateLimitPolicy::from_env().map_err(|e| {
        error!("Invalid rate limit policy: {}", e);
        e
    })?;
    let backend = CounterBackend::from_env()?;

    info!(
        max_team_size = rules.max_team_size,
        overflow_policy = ?rules.overflow_policy,
        failure_mode = ?policy.failure_mode,
        counter_backend = ?backend,
        "Configuration loaded successfully"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = AppServices::build(
        Arc::new(MemoryStore::new()),
        rules,
        policy,
        backend,
        clock.clone(),
    );

    if let Some(counters) = services.memory_counters.clone() {
        spawn_rate_limit_cleanup(
            counters,
            clock,
            Duration::from_secs(config.rate_limit_cleanup_secs.max(1)),
        );
    }

    let app = hackhub_app::create_app(&services, AuthConfig::from(&config));

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .into_inner(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server starting on http://{}", addr);
    info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
