//! Conversational book recommendations over the live catalog.
//!
//! The generator is only ever asked about books the requester could actually
//! trade for, and its reply is matched back to a catalog entry by title.
//! The match is lexical and approximate; treat it as a hint.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::catalog_service::map_book_error;
use crate::domain::ports::{
    BookRepository, ChatPrompt, Recommendation, RecommendationRequest, Recommendations,
    TextGenerator,
};
use crate::domain::{CatalogEntry, Error, UserId};

/// Reply used when nothing is available to recommend.
pub const NO_BOOKS_REPLY: &str =
    "I apologize, but there are no books available for exchange at the moment.";
/// Reply used when the text generator fails.
pub const TROUBLE_REPLY: &str =
    "I apologize, but I'm having trouble processing your request right now.";

/// Service implementing the [`Recommendations`] driving port.
#[derive(Clone)]
pub struct RecommendationService<B, G: ?Sized> {
    books: Arc<B>,
    generator: Arc<G>,
}

impl<B, G: ?Sized> RecommendationService<B, G> {
    pub fn new(books: Arc<B>, generator: Arc<G>) -> Self {
        Self { books, generator }
    }
}

/// Build the system instruction restricting the generator to `books`.
pub fn system_prompt(books: &[CatalogEntry]) -> String {
    let listing = books
        .iter()
        .map(|entry| {
            format!(
                "- Title: {}, Author: {}",
                entry.book.title(),
                entry.book.author()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful book exchange assistant. Here are the available books:\n\n\
         {listing}\n\n\
         Your task is to:\n\
         1. Help users find books they might enjoy from this list\n\
         2. Only recommend books from the provided list\n\
         3. Keep responses concise and friendly\n\
         4. If asked about books not in the list, explain that you can only recommend from available books\n\
         5. Keep track of previous recommendations in the conversation"
    )
}

/// First entry, in catalog order, whose title occurs in `reply` ignoring case.
pub fn match_title<'a>(reply: &str, books: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    let haystack = reply.to_lowercase();
    books
        .iter()
        .find(|entry| haystack.contains(&entry.book.title().to_lowercase()))
}

#[async_trait]
impl<B, G> Recommendations for RecommendationService<B, G>
where
    B: BookRepository,
    G: TextGenerator + ?Sized,
{
    async fn recommend(
        &self,
        requester: &UserId,
        request: &RecommendationRequest,
    ) -> Result<Recommendation, Error> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(Error::invalid_request("message must not be empty"));
        }

        let books = self
            .books
            .list_available(Some(requester.clone()))
            .await
            .map_err(map_book_error)?;
        if books.is_empty() {
            debug!(user_id = %requester, "no books to recommend");
            return Ok(Recommendation {
                reply: NO_BOOKS_REPLY.to_owned(),
                book: None,
                failure: None,
            });
        }

        let prompt = ChatPrompt {
            system: system_prompt(&books),
            history: request.history.clone(),
            message: message.to_owned(),
        };
        match self.generator.generate(&prompt).await {
            Ok(reply) => {
                let book = match_title(&reply, &books).cloned();
                Ok(Recommendation {
                    reply,
                    book,
                    failure: None,
                })
            }
            Err(error) => {
                warn!(%error, user_id = %requester, "recommendation degraded");
                Ok(Recommendation {
                    reply: TROUBLE_REPLY.to_owned(),
                    book: None,
                    failure: Some(error.to_string()),
                })
            }
        }
    }
}
