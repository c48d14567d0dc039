//! Application settings loaded via OrthoConfig.
//!
//! Every field can come from the command line, a config file, or a
//! `BOOKSWAP_*` environment variable.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use bookswap::outbound::chat::{CompletionOptions, DEFAULT_BASE_URL};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the marketplace server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKSWAP")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Directory for uploaded cover images; covers are discarded when absent.
    pub upload_dir: Option<PathBuf>,
    /// API key for the chat completion service; recommendations degrade when absent.
    pub chat_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API.
    pub chat_base_url: Option<String>,
    /// Completion model name.
    pub chat_model: Option<String>,
    /// Request timeout for completions, in seconds.
    pub chat_timeout_secs: Option<u64>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).parse()
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn chat_base_url(&self) -> &str {
        self.chat_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs.unwrap_or(DEFAULT_CHAT_TIMEOUT_SECS))
    }

    pub fn completion_options(&self) -> CompletionOptions {
        let mut options = CompletionOptions::default();
        if let Some(model) = &self.chat_model {
            options.model.clone_from(model);
        }
        options
    }
}
