//! Wire format of the chat-completions endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::ChatMessage;

#[derive(Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// First entry of `choices`, in one of the shapes providers return.
///
/// `Message` wins over `Text` when both fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// `{ "message": { "content": "..." } }`
    Message(String),
    /// `{ "text": "..." }`
    Text(String),
    Unrecognized,
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        #[allow(dead_code)]
        enum Shape {
            Message { message: ChoiceMessage },
            Text { text: String },
            Other(Value),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Message { message } => Choice::Message(message.content),
            Shape::Text { text } => Choice::Text(text),
            Shape::Other(_) => Choice::Unrecognized,
        })
    }
}

impl Choice {
    /// Interpret a parsed response body. Any shape without a first choice
    /// (wrong top-level type, missing or empty `choices`) is `Unrecognized`.
    pub fn from_body(body: Value) -> Self {
        serde_json::from_value::<CompletionResponse>(body)
            .ok()
            .and_then(|response| response.choices.into_iter().next())
            .unwrap_or(Choice::Unrecognized)
    }

    /// The assistant text, if any. Empty text counts as none.
    pub fn into_text(self) -> Option<String> {
        match self {
            Choice::Message(text) | Choice::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}
