//! Authentication primitives: login credentials, registrations and profile
//! changes.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{EmailAddress, UserValidationError, Username, parse_location};

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
    /// Another user field failed validation.
    InvalidField(UserValidationError),
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidField(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for LoginValidationError {}

impl From<UserValidationError> for LoginValidationError {
    fn from(value: UserValidationError) -> Self {
        match value {
            UserValidationError::EmptyUsername => Self::EmptyUsername,
            other => Self::InvalidField(other),
        }
    }
}

/// Plain-text secret supplied by a caller; wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty secret. Whitespace is retained to avoid
    /// surprising credential comparisons.
    pub fn new(raw: &str) -> Result<Self, LoginValidationError> {
        if raw.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Encoded credential hash as produced by a `CredentialHasher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty.
///
/// # Examples
/// ```
/// use bookswap::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("alice", "password").unwrap();
/// assert_eq!(creds.username(), "alice");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Password::new(password)?,
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.expose()
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: Username,
    password: Password,
    email: Option<EmailAddress>,
    location: Option<String>,
}

impl Registration {
    /// Validate raw sign-up fields. Blank email or location means unset.
    pub fn try_from_parts(
        username: &str,
        password: &str,
        email: Option<&str>,
        location: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            password: Password::new(password)?,
            email: EmailAddress::parse_optional(email)?,
            location: parse_location(location)?,
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Partial profile change. `None` leaves a field untouched; for `email` and
/// `location`, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    email: Option<Option<EmailAddress>>,
    location: Option<Option<String>>,
    password: Option<Password>,
}

impl ProfileUpdate {
    pub fn try_from_parts(
        email: Option<&str>,
        location: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        Ok(Self {
            email: email
                .map(|raw| EmailAddress::parse_optional(Some(raw)))
                .transpose()?,
            location: location
                .map(|raw| parse_location(Some(raw)))
                .transpose()?,
            password: password.map(Password::new).transpose()?,
        })
    }

    pub fn email(&self) -> Option<Option<&EmailAddress>> {
        self.email.as_ref().map(Option::as_ref)
    }

    pub fn location(&self) -> Option<Option<&str>> {
        self.location.as_ref().map(Option::as_deref)
    }

    pub fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }
}
