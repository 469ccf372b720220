use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::completion::{Choice, CompletionRequest};
use crate::config::Endpoint;
use crate::conversation::Outcome;
use crate::credential::ApiKey;
use crate::error::ChatError;
use crate::state::ChatMessage;

/// Sends one turn of the conversation to the configured endpoint
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    endpoint: Endpoint,
    model: String,
}

impl CompletionClient {
    pub fn new(endpoint: Endpoint, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one turn to its terminal outcome. Never fails: every error is
    /// logged and folded into `Outcome::Failed`.
    pub async fn send_turn(&self, history: &[ChatMessage], key: Option<&ApiKey>) -> Outcome {
        match self.query(history, key).await {
            Ok(text) => Outcome::Reply(text),
            Err(err) => {
                match &err {
                    ChatError::MissingCredential => warn!("{}", err),
                    _ => error!("{}", err),
                }
                Outcome::Failed(err.failure())
            }
        }
    }

    #[instrument(skip_all, fields(url = self.endpoint.url(), turns = history.len()))]
    pub async fn query(
        &self,
        history: &[ChatMessage],
        key: Option<&ApiKey>,
    ) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: history,
        };

        let mut builder = self
            .client
            .post(self.endpoint.url())
            .header("Content-Type", "application/json");

        if let Endpoint::Direct { referer, title, .. } = &self.endpoint {
            let key = key.ok_or(ChatError::MissingCredential)?;
            builder = builder.bearer_auth(key.expose());
            if let Some(referer) = referer {
                builder = builder.header("HTTP-Referer", referer);
            }
            if let Some(title) = title {
                builder = builder.header("X-Title", title);
            }
        }

        debug!(model = %self.model, "sending completion request");
        let response = builder.json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable response>".to_string());
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // A body that cannot be read counts as unparseable
        let raw = response.text().await.unwrap_or_default();
        let body: serde_json::Value = serde_json::from_str(&raw).map_err(ChatError::InvalidJson)?;

        match Choice::from_body(body.clone()).into_text() {
            Some(text) => {
                info!(chars = text.chars().count(), "received assistant reply");
                Ok(text)
            }
            None => Err(ChatError::NoContent(body)),
        }
    }
}
