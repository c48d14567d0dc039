//! Backend entry-point: loads settings, wires adapters, and serves the REST API.

mod server;

use std::io;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bookswap::inbound::http::health::HealthState;
use bookswap::inbound::http::session_config::{BuildMode, session_settings_from_env};
use bookswap::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::{AppSettings, ChatConfig, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| io::Error::other(e.to_string()))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let bind_addr = settings
        .bind_addr()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    );

    if let Some(database_url) = settings.database_url.as_deref() {
        if settings.run_migrations {
            run_pending_migrations(database_url)
                .await
                .map_err(io::Error::other)?;
        }
        let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.db_pool_size()))
            .await
            .map_err(io::Error::other)?;
        config = config.with_db_pool(pool);
    }
    if let Some(dir) = settings.upload_dir.clone() {
        config = config.with_upload_dir(dir);
    }
    if let Some(api_key) = settings.chat_api_key.as_deref() {
        config = config.with_chat(ChatConfig::new(
            api_key,
            settings.chat_base_url(),
            settings.chat_timeout(),
            settings.completion_options(),
        ));
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "bookswap listening");
    server.await
}
