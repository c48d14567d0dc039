//! Catalog API handlers.
//!
//! ```text
//! POST /api/v1/books {"title":"Dune","author":"Frank Herbert","cover":{"fileName":"dune.png","data":"iVBO..."}}
//! GET /api/v1/books
//! GET /api/v1/books/user?status=pending
//! DELETE /api/v1/books/{bookId}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CoverUpload, NewListing};
use crate::domain::{BookDetails, BookId, BookStatus, CatalogEntry, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_encoding_error, invalid_value_error, map_book_validation_error, parse_uuid,
};

const STATUS_FILTER_EXPECTED: &str = "one of available, pending, exchanged, all";

/// Cover image carried inline as base64.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverPayload {
    #[schema(example = "dune.png")]
    pub file_name: String,
    /// Standard base64 encoding of the file bytes.
    pub data: String,
}

/// Body for `POST /api/v1/books`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<CoverPayload>,
}

/// A book as shown in listings.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    #[schema(example = "0b6f9c4e-2f0c-4d8e-9a55-3c2d1f0e8b7a")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    /// Owner's username.
    pub owner: String,
    pub status: BookStatus,
    /// Stored cover reference, relative to the upload directory.
    pub cover_image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CatalogEntry> for BookResponse {
    fn from(entry: CatalogEntry) -> Self {
        let CatalogEntry { book, owner } = entry;
        Self {
            id: book.id().to_string(),
            title: book.title().to_owned(),
            author: book.author().to_owned(),
            description: book.details().description().map(str::to_owned),
            owner: owner.to_string(),
            status: book.status(),
            cover_image: book.cover_image().map(|image| image.as_ref().to_owned()),
            created_at: book.created_at(),
        }
    }
}

/// Query for `GET /api/v1/books/user`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OwnedBooksQuery {
    /// `available` (default), `pending`, `exchanged`, or `all`.
    pub status: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<BookStatus>, Error> {
    match raw {
        None => Ok(Some(BookStatus::Available)),
        Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            invalid_value_error(FieldName::new("status"), value, STATUS_FILTER_EXPECTED)
        }),
    }
}

fn decode_cover(payload: CoverPayload) -> Result<CoverUpload, Error> {
    let bytes = STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|_| invalid_encoding_error(FieldName::new("cover.data")))?;
    Ok(CoverUpload {
        file_name: payload.file_name,
        bytes,
    })
}

pub(crate) fn parse_book_id(raw: &str, field: &'static str) -> Result<BookId, Error> {
    parse_uuid(raw, FieldName::new(field)).map(BookId::from_uuid)
}

fn to_responses(entries: Vec<CatalogEntry>) -> Vec<BookResponse> {
    entries.into_iter().map(BookResponse::from).collect()
}

/// List a book for exchange.
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = ListBookRequest,
    responses(
        (status = 201, description = "Book listed", body = BookResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["books"],
    operation_id = "listBook"
)]
#[post("/books")]
pub async fn list_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ListBookRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let ListBookRequest {
        title,
        author,
        description,
        cover,
    } = payload.into_inner();
    let details = BookDetails::try_new(&title, &author, description.as_deref())
        .map_err(map_book_validation_error)?;
    let cover = cover.map(decode_cover).transpose()?;

    let entry = state
        .catalog
        .list_book(&owner, NewListing { details, cover })
        .await?;
    Ok(HttpResponse::Created().json(BookResponse::from(entry)))
}

/// Browse available books. Signed-in callers do not see their own.
#[utoipa::path(
    get,
    path = "/api/v1/books",
    responses(
        (status = 200, description = "Available books, newest first", body = [BookResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["books"],
    operation_id = "browseBooks",
    security([])
)]
#[get("/books")]
pub async fn browse_books(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookResponse>>> {
    let viewer = session.user_id()?;
    let entries = state.catalog.browse(viewer).await?;
    Ok(web::Json(to_responses(entries)))
}

/// The caller's own books.
#[utoipa::path(
    get,
    path = "/api/v1/books/user",
    params(OwnedBooksQuery),
    responses(
        (status = 200, description = "Owned books, newest first", body = [BookResponse]),
        (status = 400, description = "Invalid status filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["books"],
    operation_id = "ownedBooks"
)]
#[get("/books/user")]
pub async fn owned_books(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OwnedBooksQuery>,
) -> ApiResult<web::Json<Vec<BookResponse>>> {
    let owner = session.require_user_id()?;
    let status = parse_status_filter(query.status.as_deref())?;
    let entries = state.catalog.owned_books(&owner, status).await?;
    Ok(web::Json(to_responses(entries)))
}

/// Withdraw an available book.
#[utoipa::path(
    delete,
    path = "/api/v1/books/{book_id}",
    params(("book_id" = String, Path, description = "Book identifier")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book is not available", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Unknown book", body = Error),
        (status = 409, description = "Book is part of a pending exchange", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["books"],
    operation_id = "deleteBook"
)]
#[delete("/books/{book_id}")]
pub async fn delete_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let book_id = parse_book_id(&path.into_inner(), "bookId")?;
    state.catalog.delete_book(&actor, book_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
