//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{
    Catalog, Exchanges, LoginService, MockCatalog, MockExchanges, MockLoginService,
    MockRecommendations, MockUserAccounts, Recommendations, UserAccounts,
};
use crate::inbound::http::state::HttpState;

/// Session middleware with a fresh key, cookie `session`, and `Secure` off.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mocks for every driving port; configure the ones a test needs.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub accounts: MockUserAccounts,
    pub catalog: MockCatalog,
    pub exchanges: MockExchanges,
    pub recommendations: MockRecommendations,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        let login: Arc<dyn LoginService> = Arc::new(self.login);
        let accounts: Arc<dyn UserAccounts> = Arc::new(self.accounts);
        let catalog: Arc<dyn Catalog> = Arc::new(self.catalog);
        let exchanges: Arc<dyn Exchanges> = Arc::new(self.exchanges);
        let recommendations: Arc<dyn Recommendations> = Arc::new(self.recommendations);
        HttpState {
            login,
            accounts,
            catalog,
            exchanges,
            recommendations,
        }
    }
}
