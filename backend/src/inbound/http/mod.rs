//! HTTP inbound adapter exposing REST endpoints.

pub mod books;
pub mod chatbot;
pub mod error;
pub mod exchanges;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;

pub use error::ApiResult;
