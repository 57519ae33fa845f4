mod auth;
mod bootstrap;
mod config;
mod crypto;
mod database;
mod error;
mod middleware;
mod models;
mod routes;
mod session;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::bootstrap::bootstrap_admin;
use crate::database::SharedRepository;
use crate::database::postgres_repository::{ConnectionError, PostgresRepository};
use crate::error::app_error::AppError;
use crate::middleware::AccessLog;
use crate::routes as app_routes;
use crate::session::{MAX_EXPIRATION_HOURS, SessionKeys, SessionManager};
use rocket::{Build, Rocket};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Anything that keeps the server from coming up. Each is fatal: the process
/// logs it and exits non-zero.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("failed to store admin credentials: {0}")]
    Bootstrap(#[source] AppError),
    #[error("server failed: {0}")]
    Launch(#[from] Box<rocket::Error>),
}

pub fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=iot_stats=debug,rocket=warn
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn check_config(config: &Config) -> Result<(), StartupError> {
    if config.api.key.is_empty() {
        return Err(StartupError::InvalidConfig("api.key must be set".to_string()));
    }
    if !(1..=MAX_EXPIRATION_HOURS).contains(&config.session.expiration_hours) {
        return Err(StartupError::InvalidConfig(format!(
            "session.expiration_hours must be between 1 and {}",
            MAX_EXPIRATION_HOURS
        )));
    }
    Ok(())
}

pub fn build_rocket(config: Config, repo: SharedRepository, sessions: SessionManager) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    rocket::custom(figment)
        .attach(AccessLog)
        .manage(config)
        .manage(repo)
        .manage(sessions)
        .mount("/", app_routes::login::routes())
        .mount("/api", app_routes::api::routes())
        .mount("/web", app_routes::web::routes())
        .mount("/health", app_routes::health::routes())
        .register("/", app_routes::error::catchers())
}

/// Loads the configuration, prepares the store and serves until shutdown.
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.logging.level, config.logging.json_format);
    check_config(&config)?;

    let store = PostgresRepository::connect(&config.database).await?;
    bootstrap_admin(&store, &config.admin).await.map_err(StartupError::Bootstrap)?;

    let repo: SharedRepository = Arc::new(store);
    let sessions = SessionManager::new(SessionKeys::generate(), repo.clone(), &config.session);

    tracing::info!(address = %config.server.address, port = config.server.port, "starting server");
    build_rocket(config, repo, sessions).launch().await.map_err(Box::new)?;
    Ok(())
}
