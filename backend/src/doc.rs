//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every handler under `inbound::http` together with
//! the session cookie security scheme. Swagger UI serves it in debug builds
//! and `cargo run --bin openapi-dump` prints it for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{BookStatus, Error, ErrorCode, ExchangeStatus};
use crate::inbound::http::books::{BookResponse, CoverPayload, ListBookRequest};
use crate::inbound::http::chatbot::{HistoryEntry, RecommendRequest, RecommendResponse};
use crate::inbound::http::exchanges::{
    DecisionBody, DecisionResponse, ExchangeRequestBody, ExchangeResponse,
    ExchangeSummaryResponse,
};
use crate::inbound::http::users::{
    LoginRequest, ProfileResponse, ProfileUpdateRequest, RegisterRequest,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Bookswap API",
        description = "Book exchange marketplace: accounts, catalog, exchange ledger and recommendations."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::books::list_book,
        crate::inbound::http::books::browse_books,
        crate::inbound::http::books::owned_books,
        crate::inbound::http::books::delete_book,
        crate::inbound::http::exchanges::request_exchange,
        crate::inbound::http::exchanges::list_exchanges,
        crate::inbound::http::exchanges::update_exchange_status,
        crate::inbound::http::chatbot::recommend,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        BookStatus,
        ExchangeStatus,
        LoginRequest,
        RegisterRequest,
        ProfileUpdateRequest,
        ProfileResponse,
        ListBookRequest,
        CoverPayload,
        BookResponse,
        ExchangeRequestBody,
        DecisionBody,
        ExchangeResponse,
        DecisionResponse,
        ExchangeSummaryResponse,
        RecommendRequest,
        HistoryEntry,
        RecommendResponse,
    )),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "books", description = "Catalog of books offered for exchange"),
        (name = "exchanges", description = "Exchange proposals and decisions"),
        (name = "chatbot", description = "Reading recommendations from the live catalog"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
