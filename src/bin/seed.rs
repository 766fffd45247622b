//! Populate the database with the bundled starter content
//!
//! Usage: `laxmi-seed [FIXTURES_DIR]`
//!
//! With a directory argument, `blog.toml` and `gallery.toml` are read from
//! it instead of the fixtures compiled into the binary. The first super
//! admin comes from `LAXMI_ADMIN_EMAIL` / `LAXMI_ADMIN_PASSWORD`.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laxmi::{
    config::Config,
    db,
    services::seed::{Fixtures, Seeder},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laxmi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_with_env(Path::new("config.yml"))?;

    let fixtures = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Loading fixtures from directory");
            Fixtures::from_dir(&dir)?
        }
        None => Fixtures::bundled()?,
    };

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    tracing::info!(database = %config.database.url, "Seeding database");
    let report = Seeder::new(pool).run(&config.admin, &fixtures).await?;

    println!("{}", report);
    Ok(())
}
