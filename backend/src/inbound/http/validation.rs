//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` name the
//! offending field and a stable machine-readable code.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{BookValidationError, Error, LoginValidationError, UserValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    InvalidEncoding,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidEncoding => "invalid_encoding",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: &str, message: impl Into<String>, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

fn value_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        name,
        format!("missing required field: {name}"),
        ErrorCode::MissingField.as_str(),
    )
}

pub(crate) fn invalid_value_error(field: FieldName, value: &str, expected: &str) -> Error {
    let message = format!("{} must be {expected}", field.as_str());
    value_error(field, message, ErrorCode::InvalidValue, value)
}

pub(crate) fn invalid_encoding_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        name,
        format!("{name} must be base64 encoded"),
        ErrorCode::InvalidEncoding.as_str(),
    )
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        let message = format!("{} must be a valid UUID", field.as_str());
        value_error(field, message, ErrorCode::InvalidUuid, value)
    })
}

/// Translate account field validation into a client error.
pub(crate) fn map_login_validation_error(err: LoginValidationError) -> Error {
    let message = err.to_string();
    match err {
        LoginValidationError::EmptyUsername => field_error("username", message, "empty_username"),
        LoginValidationError::EmptyPassword => field_error("password", message, "empty_password"),
        LoginValidationError::InvalidField(inner) => {
            let (field, code) = match inner {
                UserValidationError::EmptyId | UserValidationError::InvalidId => {
                    ("id", "invalid_id")
                }
                UserValidationError::EmptyUsername => ("username", "empty_username"),
                UserValidationError::UsernameTooShort { .. } => ("username", "username_too_short"),
                UserValidationError::UsernameTooLong { .. } => ("username", "username_too_long"),
                UserValidationError::UsernameInvalidCharacters => {
                    ("username", "username_invalid_characters")
                }
                UserValidationError::InvalidEmail => ("email", "invalid_email"),
                UserValidationError::LocationTooLong { .. } => ("location", "location_too_long"),
            };
            field_error(field, message, code)
        }
    }
}

/// Translate book detail validation into a client error.
pub(crate) fn map_book_validation_error(err: BookValidationError) -> Error {
    let message = err.to_string();
    match err {
        BookValidationError::EmptyTitle => field_error("title", message, "empty_title"),
        BookValidationError::EmptyAuthor => field_error("author", message, "empty_author"),
        BookValidationError::TooLong { field, .. } => field_error(field, message, "too_long"),
    }
}
