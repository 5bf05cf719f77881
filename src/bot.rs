//! The inbound message flow and the operations the core exposes to it.
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::broadcast::{BroadcastEngine, CycleResult, FrozenBroadcastStats, GroupStats};
use crate::cache::ResponseCache;
use crate::commands::{CommandParser, CommandType, KeywordParser};
use crate::limiters::RateLimiter;
use crate::replies::{fallback, CannedReplyGenerator, ReplyGenerator};
use crate::settings::Settings;
use crate::store::{HistoryEntry, StateStore, StoreStats, SweepReport};
use crate::transport::{LogTransport, TimeoutTransport, Transport, WebhookTransport};

/// What happened to one inbound message
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum InboundOutcome {
    InvalidSender,
    RateLimited,
    EmptyMessage,
    UnknownCommand,
    GenerationTimedOut,
    Delivered(CycleResult),
    BroadcastFailed(CycleResult),
}

/// Normalize a phone number to E.164, assuming North America for bare numbers
pub fn normalize_sender(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format!("+1{}", digits)),
        11 if digits.starts_with('1') => Some(format!("+{}", digits)),
        11 => Some(format!("+1{}", digits)),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Bot {
    store: Arc<StateStore>,
    limiter: RateLimiter,
    cache: ResponseCache,
    engine: BroadcastEngine,
    parser: Arc<dyn CommandParser>,
    generator: Arc<dyn ReplyGenerator>,
    transport: Arc<dyn Transport>,
    response_timeout: Duration,
}

impl Bot {
    pub fn new(
        store: Arc<StateStore>,
        transport: Arc<dyn Transport>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(store.clone()),
            cache: ResponseCache::new(store.clone()),
            engine: BroadcastEngine::new(store.clone(), transport.clone()),
            parser: Arc::new(KeywordParser),
            generator: Arc::new(CannedReplyGenerator::new(store.clone())),
            transport,
            response_timeout,
            store,
        }
    }

    /// Wire a bot from settings: relay transport if configured, log-only otherwise
    pub fn from_settings(settings: &Settings) -> Self {
        let store = Arc::new(StateStore::new(settings.store.clone()));
        let transport: Arc<dyn Transport> = match &settings.relay_url {
            Some(url) => {
                info!("Delivering through relay at {}", url);
                Arc::new(TimeoutTransport::new(
                    WebhookTransport::new(url.clone()),
                    settings.delivery_timeout(),
                ))
            }
            None => {
                info!("No relay configured, deliveries will only be logged");
                Arc::new(TimeoutTransport::new(LogTransport, settings.delivery_timeout()))
            }
        };
        Self::new(store, transport, settings.response_timeout())
    }

    pub fn with_parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn engine(&self) -> &BroadcastEngine {
        &self.engine
    }

    // Operations exposed to callers

    /// Rate-limit gate, checked before any reply is generated
    pub fn admit(&self, sender: &str) -> bool {
        self.limiter.check_and_consume(sender)
    }

    pub async fn record_event_and_broadcast(
        &self,
        sender: &str,
        command_type: &str,
        target: Option<&str>,
        reply: &str,
    ) -> CycleResult {
        self.engine
            .record_event_and_broadcast(sender, command_type, target, reply)
            .await
    }

    pub fn cache_get(&self, command_type: &str, target: Option<&str>) -> Option<String> {
        self.cache.get(command_type, target)
    }

    pub fn cache_put(&self, command_type: &str, target: Option<&str>, value: &str) {
        self.cache.put(command_type, target, value)
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    pub fn group_stats(&self) -> GroupStats {
        self.engine.group_stats()
    }

    pub fn broadcast_stats(&self) -> FrozenBroadcastStats {
        self.engine.stats()
    }

    pub fn history(&self, sender: &str) -> Vec<HistoryEntry> {
        self.store.get_history(sender)
    }

    pub fn sweep(&self) -> SweepReport {
        self.store.sweep()
    }

    // Inbound flow

    /// Run one inbound message through admission, parsing, generation and broadcast
    #[instrument(skip(self, body), level = "debug")]
    pub async fn handle_message(&self, from: &str, body: &str) -> InboundOutcome {
        let sender = match normalize_sender(from) {
            Some(sender) => sender,
            None => {
                warn!(from, "Invalid phone number format");
                return InboundOutcome::InvalidSender;
            }
        };

        if !self.admit(&sender) {
            info!(sender = sender.as_str(), "Rate limit hit");
            self.reply_directly(&sender, fallback::RATE_LIMIT).await;
            return InboundOutcome::RateLimited;
        }

        if body.trim().is_empty() {
            self.reply_directly(&sender, fallback::EMPTY_MESSAGE).await;
            return InboundOutcome::EmptyMessage;
        }

        let parsed = match self.parser.parse(body) {
            Some(parsed) => parsed,
            None => {
                info!(sender = sender.as_str(), command = "unknown", "SMS received");
                self.reply_directly(&sender, fallback::UNKNOWN_COMMAND).await;
                return InboundOutcome::UnknownCommand;
            }
        };
        let command = parsed.command.as_str();
        let target = parsed.target.as_deref();
        info!(sender = sender.as_str(), command, target, "SMS received");

        // a timed out generation never reaches the broadcast engine
        let reply = match self.generate_with_timeout(parsed.command, target, &sender).await {
            Some(reply) => reply,
            None => {
                self.reply_directly(&sender, fallback::API_FAILURE).await;
                return InboundOutcome::GenerationTimedOut;
            }
        };

        let cycle = self
            .record_event_and_broadcast(&sender, command, target, &reply)
            .await;
        if !cycle.is_success() {
            warn!(sender = sender.as_str(), "Broadcast reached nobody");
            self.reply_directly(&sender, fallback::API_FAILURE).await;
            return InboundOutcome::BroadcastFailed(cycle);
        }

        self.limiter.mark_completed(&sender);
        InboundOutcome::Delivered(cycle)
    }

    /// `None` on timeout; a failed generation yields the fallback text
    async fn generate_with_timeout(
        &self,
        command: CommandType,
        target: Option<&str>,
        sender: &str,
    ) -> Option<String> {
        let generation = self.generator.generate(command, target, sender);
        match tokio::time::timeout(self.response_timeout, generation).await {
            Ok(Ok(reply)) => Some(reply),
            Ok(Err(err)) => {
                warn!(err = %err, "Response generation failed");
                Some(fallback::API_FAILURE.to_string())
            }
            Err(_elapsed) => {
                warn!(
                    timeout_ms = self.response_timeout.as_millis() as u64,
                    "Response generation timed out"
                );
                None
            }
        }
    }

    /// One-off message to the sender only; failures are logged and dropped
    async fn reply_directly(&self, recipient: &str, text: &str) {
        if let Err(err) = self.transport.deliver(recipient, text).await {
            warn!(recipient, err = %err, "Failed to send direct reply");
        }
    }
}
