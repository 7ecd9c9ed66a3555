//! Chat relay to the external NLU dialogue server's REST webhook.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use chaton_core::config::ChatConfig;
use chaton_core::error::ChatonError;

/// Reply when the dialogue server answers with nothing.
pub const NO_REPLY: &str = "Sorry, I did not understand that.";
/// Reply when the dialogue server cannot be reached.
pub const UNAVAILABLE: &str = "Sorry, the chatbot service is unavailable right now.";

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct RelayReply {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client bound to the dialogue server's webhook URL.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    url: String,
}

impl ChatRelay {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatonError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatonError::Relay(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: config.nlu_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forward one message and return the text of the first reply, if any.
    pub async fn send(&self, sender: Option<&str>, message: &str) -> Result<Option<String>, ChatonError> {
        let response = self
            .client
            .post(&self.url)
            .json(&RelayRequest { sender, message })
            .send()
            .await
            .map_err(|e| ChatonError::Relay(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatonError::Relay(format!(
                "Dialogue server returned {}",
                status
            )));
        }

        let replies: Vec<RelayReply> = response
            .json()
            .await
            .map_err(|e| ChatonError::Relay(format!("Invalid dialogue server reply: {}", e)))?;

        Ok(replies.into_iter().next().and_then(|r| r.text))
    }

    /// Like [`ChatRelay::send`], but always yields something to show the visitor.
    pub async fn reply_for(&self, sender: Option<&str>, message: &str) -> String {
        match self.send(sender, message).await {
            Ok(Some(text)) => text,
            Ok(None) => NO_REPLY.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "Chat relay failed");
                UNAVAILABLE.to_string()
            }
        }
    }
}
