//! Group broadcast over independent point-to-point channels.
//!
//! A cycle registers the sender, resolves the audience from the active set,
//! delivers to every member concurrently and reports how many deliveries
//! landed. Individual delivery failures are tallied and logged; only a
//! failure to work out the audience fails the cycle as a whole.
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::store::StateStore;
use crate::transport::Transport;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BroadcastOutcome {
    pub broadcast_count: usize,
    pub recipients: Vec<String>,
    pub success: bool,
}

/// Observability metadata attached to a completed cycle; nothing branches on it
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupContext {
    pub sender: String,
    pub active_members: usize,
    pub recent_senders: usize,
    pub is_group_chat: bool,
    pub group_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum BroadcastError {
    /// The sender id was empty
    InvalidSender,
    /// Working out who should receive the message failed
    AudienceResolution(String),
}

impl std::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastError::InvalidSender => write!(f, "sender id is empty"),
            BroadcastError::AudienceResolution(msg) => {
                write!(f, "audience resolution failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for BroadcastError {}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum CycleResult {
    Completed {
        outcome: BroadcastOutcome,
        group: GroupContext,
    },
    Failed {
        error: BroadcastError,
    },
}

impl CycleResult {
    /// True only for a completed cycle with at least one delivery
    pub fn is_success(&self) -> bool {
        matches!(self, CycleResult::Completed { outcome, .. } if outcome.success)
    }

    pub fn outcome(&self) -> Option<&BroadcastOutcome> {
        match self {
            CycleResult::Completed { outcome, .. } => Some(outcome),
            CycleResult::Failed { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecentActivity {
    pub id: String,
    pub last_command: String,
    pub last_active_at: i64,
    pub message_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupStats {
    pub active_members: usize,
    pub conversation_logs: usize,
    pub recent_activity: Vec<RecentActivity>,
}

/// Running totals across all cycles
#[derive(Debug, Default)]
pub struct BroadcastStats {
    pub cycles: AtomicU64,
    pub failed_cycles: AtomicU64,
    pub deliveries_succeeded: AtomicU64,
    pub deliveries_failed: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FrozenBroadcastStats {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
}

impl BroadcastStats {
    pub fn freeze(&self) -> FrozenBroadcastStats {
        FrozenBroadcastStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }
}

/// Order the listed senders for delivery, turning a panic while listing
/// them into `AudienceResolution`
fn audience_from<F>(sender: &str, list: F) -> Result<Vec<String>, BroadcastError>
where
    F: FnOnce() -> Vec<String>,
{
    let listed = panic::catch_unwind(AssertUnwindSafe(list)).map_err(|cause| {
        let msg = cause
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| cause.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        BroadcastError::AudienceResolution(msg)
    })?;

    let mut audience: Vec<String> = listed.into_iter().filter(|id| id != sender).collect();
    audience.sort();
    audience.push(sender.to_string());
    Ok(audience)
}

#[derive(Clone, Debug)]
pub struct BroadcastEngine {
    store: Arc<StateStore>,
    transport: Arc<dyn Transport>,
    stats: Arc<BroadcastStats>,
}

impl BroadcastEngine {
    pub fn new(store: Arc<StateStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            transport,
            stats: Arc::new(BroadcastStats::default()),
        }
    }

    /// Register the sender, then fan `reply` out to the current audience
    #[instrument(skip(self, reply), level = "debug")]
    pub async fn record_event_and_broadcast(
        &self,
        sender: &str,
        command_type: &str,
        target: Option<&str>,
        reply: &str,
    ) -> CycleResult {
        self.stats.cycles.fetch_add(1, Ordering::Relaxed);
        if sender.is_empty() {
            self.stats.failed_cycles.fetch_add(1, Ordering::Relaxed);
            return CycleResult::Failed {
                error: BroadcastError::InvalidSender,
            };
        }

        self.store.record_activity(sender, command_type);
        self.store.append_history(sender, command_type, target);

        let audience = match self.resolve_audience(sender) {
            Ok(audience) => audience,
            Err(err) => {
                error!(sender, err = %err, "Broadcast aborted");
                self.stats.failed_cycles.fetch_add(1, Ordering::Relaxed);
                return CycleResult::Failed { error: err };
            }
        };

        let outcome = self.deliver_all(audience, reply).await;
        info!(
            sender,
            broadcast_count = outcome.broadcast_count,
            audience = outcome.recipients.len(),
            "Group broadcast finished"
        );
        let group = self.group_context(sender, outcome.recipients.len());
        CycleResult::Completed { outcome, group }
    }

    /// Every known sender other than `sender`, followed by `sender` itself.
    ///
    /// Stale entries the sweep has not removed yet are included.
    pub fn resolve_audience(&self, sender: &str) -> Result<Vec<String>, BroadcastError> {
        let store = &self.store;
        audience_from(sender, || store.list_active())
    }

    /// Deliver to everyone at once and wait for all of them, success or not
    pub async fn deliver_all(&self, audience: Vec<String>, text: &str) -> BroadcastOutcome {
        let transport = self.transport.clone();
        let deliveries = audience.iter().map(|recipient| {
            let transport = transport.clone();
            async move {
                let result = transport.deliver(recipient, text).await;
                (recipient, result)
            }
        });

        let mut succeeded = 0usize;
        for (recipient, result) in join_all(deliveries).await {
            match result {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    warn!(
                        recipient = recipient.as_str(),
                        transport = transport.name(),
                        err = %err,
                        "Delivery failed"
                    );
                }
            }
        }
        let failed = audience.len() - succeeded;
        self.stats
            .deliveries_succeeded
            .fetch_add(succeeded as u64, Ordering::Relaxed);
        self.stats
            .deliveries_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
        if succeeded == 0 {
            self.stats.failed_cycles.fetch_add(1, Ordering::Relaxed);
        }

        BroadcastOutcome {
            broadcast_count: succeeded,
            success: succeeded > 0,
            recipients: audience,
        }
    }

    pub fn group_context(&self, sender: &str, audience_size: usize) -> GroupContext {
        GroupContext {
            sender: sender.to_string(),
            active_members: self.store.list_active().len(),
            recent_senders: self.store.recent_senders().len(),
            is_group_chat: audience_size > 1,
            group_size: audience_size,
        }
    }

    /// Active members with a known last command, most recent first
    pub fn group_stats(&self) -> GroupStats {
        let mut recent_activity: Vec<RecentActivity> = self
            .store
            .list_active()
            .iter()
            .filter_map(|id| self.store.active_sender(id))
            .filter_map(|sender| {
                sender.last_command.map(|last_command| RecentActivity {
                    id: sender.id,
                    last_command,
                    last_active_at: sender.last_active_at,
                    message_count: sender.message_count,
                })
            })
            .collect();
        recent_activity.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));

        let stats = self.store.stats();
        GroupStats {
            active_members: stats.active_users,
            conversation_logs: stats.conversation_logs,
            recent_activity,
        }
    }

    pub fn stats(&self) -> FrozenBroadcastStats {
        self.stats.freeze()
    }
}
