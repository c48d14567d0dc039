//! Wire shapes for OpenAI-compatible chat completion calls.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{ChatPrompt, ChatRole};

#[derive(Debug, Serialize)]
pub(super) struct CompletionRequestDto<'a> {
    pub(super) model: &'a str,
    pub(super) messages: Vec<MessageDto<'a>>,
    pub(super) temperature: f32,
    pub(super) max_tokens: u32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct MessageDto<'a> {
    pub(super) role: &'a str,
    pub(super) content: &'a str,
}

impl<'a> CompletionRequestDto<'a> {
    pub(super) fn from_prompt(
        prompt: &'a ChatPrompt,
        model: &'a str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        let mut messages = Vec::with_capacity(prompt.history.len() + 2);
        messages.push(MessageDto {
            role: "system",
            content: &prompt.system,
        });
        messages.extend(prompt.history.iter().map(|turn| MessageDto {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(MessageDto {
            role: ChatRole::User.as_str(),
            content: &prompt.message,
        });
        Self {
            model,
            messages,
            temperature,
            max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionResponseDto {
    #[serde(default)]
    pub(super) choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceDto {
    pub(super) message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceMessageDto {
    pub(super) content: Option<String>,
}

impl CompletionResponseDto {
    /// Text of the first choice, if any.
    pub(super) fn into_reply(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}
