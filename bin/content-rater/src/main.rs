//! # content-rater Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use configs::{LogFormat, Settings};
use cr_api::{configure_routes, middleware, AppState};
use cr_core::{ContentRepo, PageLimits, RatingRepo, Services};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use cr_db_sqlite::SqliteRepo;

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use cr_store_memory::{MemoryContentRepo, MemoryRatingRepo};

#[cfg(not(any(feature = "db-sqlite", feature = "db-memory")))]
compile_error!("enable at least one storage feature: `db-sqlite` or `db-memory`");

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

type Stores = (Arc<dyn ContentRepo>, Arc<dyn RatingRepo>);

#[cfg(feature = "db-sqlite")]
async fn open_stores(settings: &Settings) -> anyhow::Result<Stores> {
    let repo = Arc::new(
        SqliteRepo::new(settings.database.url(), settings.database.max_connections).await?,
    );
    let contents: Arc<dyn ContentRepo> = repo.clone();
    let ratings: Arc<dyn RatingRepo> = repo;
    Ok((contents, ratings))
}

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
async fn open_stores(_settings: &Settings) -> anyhow::Result<Stores> {
    tracing::warn!("using the in-memory store, data is lost on shutdown");
    let contents: Arc<dyn ContentRepo> = Arc::new(MemoryContentRepo::new());
    let ratings: Arc<dyn RatingRepo> = Arc::new(MemoryRatingRepo::new());
    Ok((contents, ratings))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    let (contents, ratings) = open_stores(&settings).await?;
    let limits = PageLimits {
        default_limit: settings.pagination.default_limit,
        max_limit: settings.pagination.max_limit,
    };
    let state = web::Data::new(AppState::new(Services::new(contents, ratings), limits));

    let (host, port) = settings.bind_addr();
    let allowed_origin = settings.cors.allowed_origin.clone();
    info!(%host, port, "content-rater starting");

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy(&allowed_origin))
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    });
    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server.bind((host.as_str(), port))?.run().await?;
    info!("content-rater stopped");
    Ok(())
}
