//! Outbound delivery interface
//!
//! The broadcast engine only ever talks to recipients through this trait.
//! Retries, if any, belong to the implementation, never to the caller.
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Deliver `text` to one recipient
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()>;

    /// Short name used in delivery logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()> {
        (**self).deliver(recipient, text).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
