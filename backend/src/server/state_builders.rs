//! Builders for the HTTP state ports.
//!
//! Repositories come from PostgreSQL when a pool is configured and from a
//! shared in-memory marketplace otherwise. Optional adapters fall back to
//! implementations that decline the work.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use bookswap::domain::ports::{
    BookRepository, DisabledImageStore, ExchangeLedgerRepository, ImageStore, TextGenerator,
    UnconfiguredTextGenerator, UserRepository,
};
use bookswap::domain::{CatalogService, ExchangeService, IdentityService, RecommendationService};
use bookswap::inbound::http::state::HttpState;
use bookswap::outbound::chat::OpenAiChatGenerator;
use bookswap::outbound::credentials::Pbkdf2CredentialHasher;
use bookswap::outbound::images::FilesystemImageStore;
use bookswap::outbound::memory::InMemoryMarketplace;
use bookswap::outbound::persistence::{
    DieselBookRepository, DieselExchangeLedgerRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Adapters shared by every service, independent of the storage backend.
struct Adapters {
    images: Arc<dyn ImageStore>,
    generator: Arc<dyn TextGenerator>,
    clock: Arc<dyn Clock>,
}

fn build_image_store(config: &ServerConfig) -> io::Result<Arc<dyn ImageStore>> {
    match &config.upload_dir {
        Some(dir) => {
            let store = FilesystemImageStore::open(dir)?;
            info!(path = %dir.display(), "storing cover images on disk");
            Ok(Arc::new(store))
        }
        None => {
            warn!("no upload directory configured; cover images will be discarded");
            Ok(Arc::new(DisabledImageStore))
        }
    }
}

fn build_text_generator(config: &ServerConfig) -> io::Result<Arc<dyn TextGenerator>> {
    match &config.chat {
        Some(chat) => {
            let generator = OpenAiChatGenerator::new(
                &chat.base_url,
                chat.api_key.as_str(),
                chat.timeout,
                chat.options.clone(),
            )
            .map_err(|message| io::Error::other(format!("chat client: {message}")))?;
            Ok(Arc::new(generator))
        }
        None => {
            warn!("no chat API key configured; recommendations are unavailable");
            Ok(Arc::new(UnconfiguredTextGenerator))
        }
    }
}

/// Wire the domain services over one set of repositories.
fn wire_services<U, B, L>(
    users: Arc<U>,
    books: Arc<B>,
    ledger: Arc<L>,
    adapters: Adapters,
) -> HttpState
where
    U: UserRepository + 'static,
    B: BookRepository + 'static,
    L: ExchangeLedgerRepository + 'static,
{
    let Adapters {
        images,
        generator,
        clock,
    } = adapters;
    let identity = Arc::new(IdentityService::new(
        users,
        Arc::new(Pbkdf2CredentialHasher::default()),
        clock.clone(),
    ));

    HttpState {
        login: identity.clone(),
        accounts: identity,
        catalog: Arc::new(CatalogService::new(books.clone(), images, clock.clone())),
        exchanges: Arc::new(ExchangeService::new(ledger, clock)),
        recommendations: Arc::new(RecommendationService::new(books, generator)),
    }
}

/// Build the HTTP state for the configured backends.
///
/// # Errors
///
/// Returns [`io::Error`] when the upload directory cannot be opened or the
/// chat client cannot be constructed.
pub fn build_http_state(config: &ServerConfig) -> io::Result<web::Data<HttpState>> {
    let adapters = Adapters {
        images: build_image_store(config)?,
        generator: build_text_generator(config)?,
        clock: Arc::new(DefaultClock),
    };

    let state = match &config.db_pool {
        Some(pool) => wire_services(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselBookRepository::new(pool.clone())),
            Arc::new(DieselExchangeLedgerRepository::new(pool.clone())),
            adapters,
        ),
        None => {
            warn!("no database configured; using the in-memory store");
            let store = Arc::new(InMemoryMarketplace::new());
            wire_services(store.clone(), store.clone(), store, adapters)
        }
    };
    Ok(web::Data::new(state))
}
