//! Conversation state machine
//!
//! All mutation of the message log goes through two transitions:
//! [`Conversation::submit`] when the user sends a draft, and
//! [`Conversation::settle`] when the turn reaches a terminal outcome. A
//! submission is refused while a turn is in flight, so `busy` always means
//! exactly one outstanding request.

use crate::state::ChatMessage;

/// Why a turn ended without a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Direct mode with no API key captured; nothing was sent
    MissingCredential,
    /// The request never produced a response (connect, DNS, timeout...)
    Transport,
    /// The endpoint answered with a non-success status
    Status(u16),
    /// The body of a success response was not JSON
    InvalidJson,
    /// JSON arrived but held no usable text
    NoContent,
}

impl Failure {
    /// Text shown in place of the model reply
    pub fn user_message(&self) -> String {
        match self {
            Failure::MissingCredential => {
                "An API key is required when not using a proxy.".to_string()
            }
            Failure::Transport => "Sorry, there was an error processing your request.".to_string(),
            Failure::Status(code) => format!("Upstream error: {}", code),
            Failure::InvalidJson => "Invalid response from model service.".to_string(),
            Failure::NoContent => "Model returned no content.".to_string(),
        }
    }
}

/// Terminal result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Failed(Failure),
}

/// Why a submission was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    EmptyDraft,
    Busy,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    draft: String,
    busy: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Accept the current draft as a user turn.
    ///
    /// On success the user message is appended, the draft cleared and the
    /// conversation marked busy. The returned history ends with the new user
    /// message and is exactly what must be sent for this turn.
    pub fn submit(&mut self) -> Result<Vec<ChatMessage>, Rejected> {
        if self.draft.trim().is_empty() {
            return Err(Rejected::EmptyDraft);
        }
        if self.busy {
            return Err(Rejected::Busy);
        }

        let content = std::mem::take(&mut self.draft);
        self.messages.push(ChatMessage::user(content));
        self.busy = true;

        Ok(self.messages.clone())
    }

    /// Apply the terminal outcome of the in-flight turn.
    ///
    /// Appends exactly one assistant message and clears `busy`. Returns
    /// `false` (and changes nothing) when no turn is in flight.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        if !self.busy {
            return false;
        }

        let content = match outcome {
            Outcome::Reply(text) => text,
            Outcome::Failed(failure) => failure.user_message(),
        };
        self.messages.push(ChatMessage::assistant(content));
        self.busy = false;
        true
    }
}
