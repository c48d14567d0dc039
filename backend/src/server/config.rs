//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use bookswap::outbound::chat::CompletionOptions;
use bookswap::outbound::persistence::DbPool;
use zeroize::Zeroizing;

/// Connection details for the chat completion service.
pub struct ChatConfig {
    pub(crate) api_key: Zeroizing<String>,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) options: CompletionOptions,
}

impl ChatConfig {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        options: CompletionOptions,
    ) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.into()),
            base_url: base_url.into(),
            timeout,
            options,
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) upload_dir: Option<PathBuf>,
    pub(crate) chat: Option<ChatConfig>,
}

impl ServerConfig {
    /// Construct a configuration with in-memory storage and no optional adapters.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            upload_dir: None,
            chat: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, every repository is backed by PostgreSQL instead of the
    /// in-memory marketplace.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Store uploaded covers below `dir`.
    #[must_use]
    pub fn with_upload_dir(mut self, dir: PathBuf) -> Self {
        self.upload_dir = Some(dir);
        self
    }

    /// Enable the recommendation assistant.
    #[must_use]
    pub fn with_chat(mut self, chat: ChatConfig) -> Self {
        self.chat = Some(chat);
        self
    }
}
