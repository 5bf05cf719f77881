//! Outbound message transports
//!
//! `LogTransport` records deliveries without sending anything, which is what
//! the service runs with when no relay is configured. `WebhookTransport`
//! hands each message to an HTTP relay. `TimeoutTransport` wraps either one
//! so a hanging recipient gives up after a bounded time.

pub mod traits;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::error::{BuddiError, Result};
pub use traits::Transport;
pub use webhook::WebhookTransport;

/// Logs delivery metadata and reports success; never logs message content
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()> {
        info!(recipient, chars = text.chars().count(), "SMS to recipient (log only)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Bounds every delivery of the wrapped transport
#[derive(Clone, Debug)]
pub struct TimeoutTransport<T> {
    inner: T,
    timeout: Duration,
}

impl<T: Transport> TimeoutTransport<T> {
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<T: Transport> Transport for TimeoutTransport<T> {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.inner.deliver(recipient, text)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BuddiError::Transport(format!(
                "delivery to {} via {} timed out after {}ms",
                recipient,
                self.inner.name(),
                self.timeout.as_millis()
            ))),
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Hanging;

    #[async_trait]
    impl Transport for Hanging {
        async fn deliver(&self, _recipient: &str, _text: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        assert!(LogTransport.deliver("+15551234567", "hi").await.is_ok());
    }

    #[tokio::test]
    async fn timeout_transport_gives_up() {
        let transport = TimeoutTransport::new(Hanging, Duration::from_millis(20));
        let err = transport.deliver("+15551234567", "hi").await.unwrap_err();
        assert!(matches!(err, BuddiError::Transport(_)));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(transport.name(), "hanging");
    }
}
