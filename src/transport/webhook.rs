//! Delivery through an HTTP relay.
//!
//! Each message becomes a JSON `POST {"to": ..., "body": ...}` to the relay
//! URL; any non-2xx answer counts as a failed delivery.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::Transport;
use crate::error::Result;
use crate::transport_error;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RelayMessage {
    pub to: String,
    pub body: String,
}

#[derive(Clone, Debug)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: Url,
}

impl WebhookTransport {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()> {
        let message = RelayMessage {
            to: recipient.to_string(),
            body: text.to_string(),
        };
        let resp = self
            .client
            .post(self.url.clone())
            .json(&message)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            debug!(recipient, status = status.as_u16(), "Relay accepted message");
            Ok(())
        } else {
            warn!(recipient, status = status.as_u16(), "Relay rejected message");
            Err(transport_error!(
                "relay answered {} for {}",
                status.as_u16(),
                recipient
            ))
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
