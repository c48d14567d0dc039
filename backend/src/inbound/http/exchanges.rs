//! Exchange ledger API handlers.
//!
//! ```text
//! POST /api/v1/request {"bookId":"…","offeredBookId":"…"}
//! POST /api/v1/request {"bookId":"…","offeredBookTitle":"Emma","offeredBookAuthor":"Jane Austen"}
//! GET /api/v1/exchanges
//! PUT /api/v1/exchanges/{exchangeId} {"status":"accepted"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{DecisionOutcome, ExchangeOffer};
use crate::domain::{
    BookDetails, Error, Exchange, ExchangeDecision, ExchangeId, ExchangeStatus, ExchangeSummary,
    InvalidDecision,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::books::parse_book_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_book_validation_error, missing_field_error, parse_uuid,
};

/// Body for `POST /api/v1/request`.
///
/// Either `offeredBookId` names one of the caller's available books, or the
/// `offeredBook*` fields describe a new book to list as the stake.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequestBody {
    pub book_id: String,
    #[serde(default)]
    pub offered_book_id: Option<String>,
    #[serde(default)]
    pub offered_book_title: Option<String>,
    #[serde(default)]
    pub offered_book_author: Option<String>,
    #[serde(default)]
    pub offered_book_description: Option<String>,
}

/// Body for `PUT /api/v1/exchanges/{exchangeId}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DecisionBody {
    /// `accepted` or `rejected`.
    #[schema(example = "accepted")]
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub id: String,
    pub requested_book_id: String,
    pub requester_id: String,
    pub offered_book_id: String,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Exchange> for ExchangeResponse {
    fn from(exchange: Exchange) -> Self {
        Self {
            id: exchange.id.to_string(),
            requested_book_id: exchange.requested_book_id.to_string(),
            requester_id: exchange.requester_id.to_string(),
            offered_book_id: exchange.offered_book_id.to_string(),
            status: exchange.status,
            created_at: exchange.created_at,
        }
    }
}

/// Outcome of a decision, including proposals rejected by the cascade.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub exchange: ExchangeResponse,
    pub auto_rejected: Vec<String>,
}

impl From<DecisionOutcome> for DecisionResponse {
    fn from(outcome: DecisionOutcome) -> Self {
        Self {
            exchange: outcome.exchange.into(),
            auto_rejected: outcome
                .auto_rejected
                .iter()
                .map(ExchangeId::to_string)
                .collect(),
        }
    }
}

/// One row of the caller's exchange history.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSummaryResponse {
    pub id: String,
    pub book_title: String,
    pub book_author: String,
    pub requester_username: String,
    pub owner: String,
    pub offered_book_title: String,
    pub offered_book_author: String,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    /// True when the caller owns the requested book and may decide.
    pub is_owner: bool,
}

impl From<ExchangeSummary> for ExchangeSummaryResponse {
    fn from(summary: ExchangeSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            book_title: summary.requested_book_title,
            book_author: summary.requested_book_author,
            requester_username: summary.requester.to_string(),
            owner: summary.owner.to_string(),
            offered_book_title: summary.offered_book_title,
            offered_book_author: summary.offered_book_author,
            status: summary.status,
            created_at: summary.created_at,
            is_owner: summary.is_owner,
        }
    }
}

fn parse_offer(body: &ExchangeRequestBody) -> Result<ExchangeOffer, Error> {
    if let Some(raw) = body.offered_book_id.as_deref() {
        return parse_book_id(raw, "offeredBookId").map(ExchangeOffer::Existing);
    }
    let title = body
        .offered_book_title
        .as_deref()
        .ok_or_else(|| missing_field_error(FieldName::new("offeredBookTitle")))?;
    let author = body
        .offered_book_author
        .as_deref()
        .ok_or_else(|| missing_field_error(FieldName::new("offeredBookAuthor")))?;
    BookDetails::try_new(title, author, body.offered_book_description.as_deref())
        .map(ExchangeOffer::New)
        .map_err(map_book_validation_error)
}

fn parse_decision(raw: &str) -> Result<ExchangeDecision, Error> {
    raw.parse().map_err(|err: InvalidDecision| {
        Error::invalid_state(err.to_string()).with_details(json!({
            "field": "status",
            "value": err.0,
        }))
    })
}

/// Propose a trade for another user's book.
#[utoipa::path(
    post,
    path = "/api/v1/request",
    request_body = ExchangeRequestBody,
    responses(
        (status = 201, description = "Exchange requested", body = ExchangeResponse),
        (status = 400, description = "Invalid request or a book is not available", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Offered book not owned, or requesting own book", body = Error),
        (status = 404, description = "Unknown book", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["exchanges"],
    operation_id = "requestExchange"
)]
#[post("/request")]
pub async fn request_exchange(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ExchangeRequestBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let body = payload.into_inner();
    let requested = parse_book_id(&body.book_id, "bookId")?;
    let offer = parse_offer(&body)?;

    let exchange = state
        .exchanges
        .request_exchange(&requester, requested, offer)
        .await?;
    Ok(HttpResponse::Created().json(ExchangeResponse::from(exchange)))
}

/// Exchanges the caller requested or received, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/exchanges",
    responses(
        (status = 200, description = "Exchange history", body = [ExchangeSummaryResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["exchanges"],
    operation_id = "listExchanges"
)]
#[get("/exchanges")]
pub async fn list_exchanges(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ExchangeSummaryResponse>>> {
    let user = session.require_user_id()?;
    let summaries = state.exchanges.list_exchanges(&user).await?;
    Ok(web::Json(
        summaries
            .into_iter()
            .map(ExchangeSummaryResponse::from)
            .collect(),
    ))
}

/// Accept or reject a pending proposal on one of the caller's books.
#[utoipa::path(
    put,
    path = "/api/v1/exchanges/{exchange_id}",
    params(("exchange_id" = String, Path, description = "Exchange identifier")),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Decision recorded", body = DecisionResponse),
        (status = 400, description = "Invalid status, or exchange already decided", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requested book's owner", body = Error),
        (status = 404, description = "Unknown exchange", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["exchanges"],
    operation_id = "updateExchangeStatus"
)]
#[put("/exchanges/{exchange_id}")]
pub async fn update_exchange_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DecisionBody>,
) -> ApiResult<web::Json<DecisionResponse>> {
    let actor = session.require_user_id()?;
    let exchange_id = parse_uuid(&path.into_inner(), FieldName::new("exchangeId"))
        .map(ExchangeId::from_uuid)?;
    let decision = parse_decision(&payload.status)?;

    let outcome = state
        .exchanges
        .update_exchange_status(&actor, exchange_id, decision)
        .await?;
    Ok(web::Json(DecisionResponse::from(outcome)))
}
