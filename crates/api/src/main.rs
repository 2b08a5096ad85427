use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cutroom_api::config::ServerConfig;
use cutroom_api::rate_limit::RateLimiter;
use cutroom_api::router::build_app_router;
use cutroom_api::share::cache::ShareSessionCache;
use cutroom_api::state::AppState;
use cutroom_api::storage::Storage;
use cutroom_api::{background, notifications};
use cutroom_events::{EmailConfig, LogMailer, MailTransport, SmtpMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cutroom_api=debug,tower_http=debug".into());
    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = cutroom_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    cutroom_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    cutroom_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage ---
    tokio::fs::create_dir_all(&config.storage_root)
        .await
        .expect("Failed to create storage root");
    let storage = Arc::new(Storage::new(
        config.storage_root.clone(),
        config.max_upload_bytes,
    ));
    tracing::info!(root = %config.storage_root.display(), "Storage ready");

    // --- Mail ---
    let mailer: Arc<dyn MailTransport> = match EmailConfig::from_env() {
        Some(email_config) => {
            let smtp = SmtpMailer::new(&email_config).expect("Invalid SMTP configuration");
            tracing::info!(host = %email_config.smtp_host, "SMTP delivery enabled");
            Arc::new(smtp)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    // --- Event bus ---
    let event_bus = Arc::new(cutroom_events::EventBus::default());
    let config = Arc::new(config);

    // Spawn notification router (turns events into emails).
    let notification_router = notifications::NotificationRouter::new(
        pool.clone(),
        Arc::clone(&mailer),
        Arc::clone(&config),
    );
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));

    // --- Share access ---
    let rate_limiter = Arc::new(RateLimiter::new());
    let share_sessions = Arc::new(ShareSessionCache::default());

    // Spawn hourly credential cleanup.
    let cleanup_cancel = tokio_util::sync::CancellationToken::new();
    let cleanup_handle = tokio::spawn(background::cleanup::run(
        pool.clone(),
        Arc::clone(&share_sessions),
        Arc::clone(&rate_limiter),
        cleanup_cancel.clone(),
    ));

    tracing::info!("Background services started (notification router, cleanup)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        event_bus: Arc::clone(&event_bus),
        mailer,
        rate_limiter,
        share_sessions,
        storage,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Cleanup job stopped");

    // Dropping the last bus handle closes the channel and stops the router.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    tracing::info!("Notification router shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
