//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{Catalog, Exchanges, LoginService, Recommendations, UserAccounts};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use bookswap::domain::{
///     CatalogService, ExchangeService, IdentityService, RecommendationService,
/// };
/// use bookswap::domain::ports::{DisabledImageStore, UnconfiguredTextGenerator};
/// use bookswap::inbound::http::state::HttpState;
/// use bookswap::outbound::credentials::Pbkdf2CredentialHasher;
/// use bookswap::outbound::memory::InMemoryMarketplace;
/// use mockable::DefaultClock;
///
/// let store = Arc::new(InMemoryMarketplace::new());
/// let clock = Arc::new(DefaultClock);
/// let identity = Arc::new(IdentityService::new(
///     store.clone(),
///     Arc::new(Pbkdf2CredentialHasher::default()),
///     clock.clone(),
/// ));
/// let state = HttpState {
///     login: identity.clone(),
///     accounts: identity,
///     catalog: Arc::new(CatalogService::new(store.clone(), Arc::new(DisabledImageStore), clock.clone())),
///     exchanges: Arc::new(ExchangeService::new(store.clone(), clock)),
///     recommendations: Arc::new(RecommendationService::new(store, Arc::new(UnconfiguredTextGenerator))),
/// };
/// let _catalog = state.catalog.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccounts>,
    pub catalog: Arc<dyn Catalog>,
    pub exchanges: Arc<dyn Exchanges>,
    pub recommendations: Arc<dyn Recommendations>,
}
