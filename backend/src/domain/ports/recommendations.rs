//! Driving port for the conversational book recommender.

use async_trait::async_trait;

use crate::domain::{CatalogEntry, Error, UserId};

use super::ChatTurn;

/// A new message plus the conversation so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
}

/// Reply shown to the user.
///
/// `failure` is only set on the degraded path and carries the delegate's
/// error text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub reply: String,
    pub book: Option<CatalogEntry>,
    pub failure: Option<String>,
}

/// Recommendation use-case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recommendations: Send + Sync {
    async fn recommend(
        &self,
        requester: &UserId,
        request: &RecommendationRequest,
    ) -> Result<Recommendation, Error>;
}
