//! Catalog entities: books, their availability status and listing details.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;
use super::user::Username;

/// Maximum length of a title or author name.
pub const BOOK_FIELD_MAX: usize = 120;
/// Maximum length of a free-text description.
pub const BOOK_DESCRIPTION_MAX: usize = 2000;

/// Identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Availability of a book.
///
/// `Pending` doubles as a reservation: a book staked in an open proposal
/// cannot back a second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    Pending,
    Exchanged,
}

impl BookStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Exchanged => "exchanged",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted status string is outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown book status: {0}")]
pub struct UnknownBookStatus(pub String);

impl FromStr for BookStatus {
    type Err = UnknownBookStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "pending" => Ok(Self::Pending),
            "exchanged" => Ok(Self::Exchanged),
            other => Err(UnknownBookStatus(other.to_owned())),
        }
    }
}

/// Validation errors for book details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("author must not be empty")]
    EmptyAuthor,
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Descriptive fields supplied when listing or offering a book.
///
/// ## Invariants
/// - `title` and `author` are trimmed and non-empty.
/// - `description` is `None` rather than blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    title: String,
    author: String,
    description: Option<String>,
}

fn bounded(value: &str, field: &'static str, max: usize) -> Result<(), BookValidationError> {
    if value.chars().count() > max {
        return Err(BookValidationError::TooLong { field, max });
    }
    Ok(())
}

impl BookDetails {
    /// Validate raw listing input.
    ///
    /// # Examples
    /// ```
    /// use bookswap::domain::BookDetails;
    ///
    /// let details = BookDetails::try_new(" Dune ", "Frank Herbert", Some("")).unwrap();
    /// assert_eq!(details.title(), "Dune");
    /// assert!(details.description().is_none());
    /// ```
    pub fn try_new(
        title: &str,
        author: &str,
        description: Option<&str>,
    ) -> Result<Self, BookValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BookValidationError::EmptyTitle);
        }
        let author = author.trim();
        if author.is_empty() {
            return Err(BookValidationError::EmptyAuthor);
        }
        bounded(title, "title", BOOK_FIELD_MAX)?;
        bounded(author, "author", BOOK_FIELD_MAX)?;

        let description = match description.map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                bounded(text, "description", BOOK_DESCRIPTION_MAX)?;
                Some(text.to_owned())
            }
        };

        Ok(Self {
            title: title.to_owned(),
            author: author.to_owned(),
            description,
        })
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn author(&self) -> &str {
        self.author.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Reference returned by the image store for an uploaded cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Physical book owned by exactly one user.
///
/// The owner is fixed at creation; only `status` changes afterwards, and only
/// through the exchange ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: BookId,
    owner_id: UserId,
    details: BookDetails,
    status: BookStatus,
    cover_image: Option<ImageRef>,
    created_at: DateTime<Utc>,
}

impl Book {
    pub fn new(
        id: BookId,
        owner_id: UserId,
        details: BookDetails,
        status: BookStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            details,
            status,
            cover_image: None,
            created_at,
        }
    }

    /// Attach a stored cover image reference.
    pub fn with_cover_image(mut self, cover_image: Option<ImageRef>) -> Self {
        self.cover_image = cover_image;
        self
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn details(&self) -> &BookDetails {
        &self.details
    }

    pub fn title(&self) -> &str {
        self.details.title()
    }

    pub fn author(&self) -> &str {
        self.details.author()
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub fn cover_image(&self) -> Option<&ImageRef> {
        self.cover_image.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Status assignment without legality checks; the ledger decides legality.
    pub fn set_status(&mut self, status: BookStatus) {
        self.status = status;
    }
}

/// Book paired with its owner's username, as shown to browsing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub book: Book,
    pub owner: Username,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "Author", BookValidationError::EmptyTitle)]
    #[case("  ", "Author", BookValidationError::EmptyTitle)]
    #[case("Title", " ", BookValidationError::EmptyAuthor)]
    fn details_require_title_and_author(
        #[case] title: &str,
        #[case] author: &str,
        #[case] expected: BookValidationError,
    ) {
        assert_eq!(
            BookDetails::try_new(title, author, None).expect_err("invalid details"),
            expected
        );
    }

    #[rstest]
    fn details_bound_title_length() {
        let long = "t".repeat(BOOK_FIELD_MAX + 1);
        assert_eq!(
            BookDetails::try_new(&long, "Author", None).expect_err("too long"),
            BookValidationError::TooLong {
                field: "title",
                max: BOOK_FIELD_MAX
            }
        );
    }

    #[rstest]
    fn details_keep_non_blank_description() {
        let details = BookDetails::try_new("Emma", "Jane Austen", Some("  first edition "))
            .expect("valid details");
        assert_eq!(details.description(), Some("first edition"));
    }

    #[rstest]
    #[case("available", BookStatus::Available)]
    #[case("pending", BookStatus::Pending)]
    #[case("exchanged", BookStatus::Exchanged)]
    fn status_round_trips_through_strings(#[case] raw: &str, #[case] status: BookStatus) {
        assert_eq!(raw.parse::<BookStatus>().expect("known status"), status);
        assert_eq!(status.as_str(), raw);
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        assert_eq!(
            "lost".parse::<BookStatus>().expect_err("unknown"),
            UnknownBookStatus("lost".to_owned())
        );
    }
}
