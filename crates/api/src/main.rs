use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use memora_api::config::ServerConfig;
use memora_api::router::build_app_router;
use memora_api::services::seed_admin_password;
use memora_api::sessions::SessionRegistry;
use memora_api::state::AppState;
use memora_db::repositories::SettingsRepo;
use memora_db::DbPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often idle guest sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        public_base_url = %config.public_base_url,
        "Loaded server configuration"
    );

    let pool = prepare_database(&config).await;

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let state = AppState::new(pool, config.clone());
    tokio::spawn(sweep_sessions(Arc::clone(&state.sessions)));
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    tracing::info!(%addr, "Memora API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "memora_api=debug,memora_db=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Connect, migrate, and make sure the settings row and admin password exist.
async fn prepare_database(config: &ServerConfig) -> DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = memora_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    memora_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    memora_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    SettingsRepo::ensure_defaults(&pool)
        .await
        .expect("Failed to seed default settings");

    let has_password = SettingsRepo::get_password_hash(&pool)
        .await
        .expect("Failed to read admin password hash")
        .is_some();
    if !has_password {
        seed_admin_password(&pool, &config.admin_password)
            .await
            .expect("Failed to seed admin password");
    }

    pool
}

async fn sweep_sessions(sessions: Arc<SessionRegistry>) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let expired = sessions.purge_expired();
        if expired > 0 {
            tracing::info!(expired, remaining = sessions.len(), "Swept idle guest sessions");
        }
    }
}

/// Resolve on SIGINT or SIGTERM.
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
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
