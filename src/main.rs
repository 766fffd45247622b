//! LAXMI - website and admin API server

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laxmi::{
    api::{self, AppState},
    config::Config,
    db,
    services::create_mailer,
    theme::ThemeEngine,
};

/// Names a directory whose templates replace the embedded ones
const TEMPLATE_DIR_ENV: &str = "LAXMI_TEMPLATE_DIR";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laxmi=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LAXMI...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!(site = %config.site.url, "Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!(url = %config.database.url, "Database connected");

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    tokio::fs::create_dir_all(&config.upload.path)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload.path.display()))?;

    let theme_engine = match std::env::var_os(TEMPLATE_DIR_ENV).map(PathBuf::from) {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using template overrides");
            ThemeEngine::with_override_dir(&dir)?
        }
        None => ThemeEngine::new()?,
    };

    let mailer = create_mailer(&config.smtp);
    if !config.smtp.is_enabled() {
        tracing::warn!("SMTP not configured, booking emails are disabled");
    }

    let state = AppState::new(pool, &config, mailer, theme_engine);

    // Rate limiter and expired session cleanup (every 5 minutes)
    {
        let limiter = state.rate_limiter.clone();
        let auth = state.auth_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                match auth.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Expired sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
                }
            }
        });
    }

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
