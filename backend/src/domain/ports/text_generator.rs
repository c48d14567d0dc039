//! Driven port for the external text-generation capability.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures of the text-generation delegate.
    pub enum TextGenerationError {
        /// No generator is configured.
        Unconfigured => "text generation is not configured",
        /// The remote call failed or timed out.
        Transport { message: String } => "text generation request failed: {message}",
        /// The remote answered with something unusable.
        InvalidResponse { message: String } => "text generation returned an invalid response: {message}",
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Assistant,
    User,
}

impl ChatRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Everything the generator needs for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

/// Produce a reply for a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, TextGenerationError>;
}

/// Generator used when no API key is configured; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTextGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredTextGenerator {
    async fn generate(&self, _prompt: &ChatPrompt) -> Result<String, TextGenerationError> {
        Err(TextGenerationError::unconfigured())
    }
}
