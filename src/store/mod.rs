//! Process-local, self-expiring state for the bot.
//!
//! Four independent collections live here: active senders, per-sender
//! history, per-sender rate windows and the reply cache. Each is a
//! `DashMap`, so every per-key operation runs under that key's shard lock
//! and `sweep` (which uses `retain`) can run alongside request traffic
//! without ever seeing a half-written entry.
use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod records;
pub mod sweeper;

use crate::clock::{Clock, SystemClock};
use crate::settings::StoreSettings;
pub use records::{ActiveSender, CacheEntry, HistoryEntry, HistoryLog, RateWindow};
pub use sweeper::Sweeper;

/// Collection sizes, for health reporting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreStats {
    pub active_users: usize,
    pub conversation_logs: usize,
    pub rate_windows: usize,
    pub cached_responses: usize,
}

/// Number of entries evicted from each collection by one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SweepReport {
    pub active_users: usize,
    pub conversation_logs: usize,
    pub rate_windows: usize,
    pub cached_responses: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.active_users + self.conversation_logs + self.rate_windows + self.cached_responses
    }
}

#[derive(Debug)]
pub struct StateStore {
    settings: StoreSettings,
    clock: Arc<dyn Clock>,
    active: DashMap<String, ActiveSender>,
    history: DashMap<String, HistoryLog>,
    rate_windows: DashMap<String, RateWindow>,
    cache: DashMap<String, CacheEntry>,
}

impl StateStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: StoreSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            active: DashMap::new(),
            history: DashMap::new(),
            rate_windows: DashMap::new(),
            cache: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    // Active senders

    /// Upsert the sender and count this event against it
    pub fn record_activity(&self, id: &str, command_type: &str) {
        let now = self.now();
        let mut sender = self
            .active
            .entry(id.to_string())
            .or_insert_with(|| ActiveSender::new(id, now));
        sender.last_active_at = now;
        sender.message_count += 1;
        sender.last_command = Some(command_type.to_string());
    }

    pub fn is_active(&self, id: &str) -> bool {
        let now = self.now();
        let ttl = self.settings.active_user_ttl_millis();
        self.active
            .get(id)
            .map(|sender| !sender.is_expired(now, ttl))
            .unwrap_or(false)
    }

    /// Every known sender id, including ones past their TTL that the
    /// sweep has not reached yet
    pub fn list_active(&self) -> Vec<String> {
        self.active.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn active_sender(&self, id: &str) -> Option<ActiveSender> {
        self.active.get(id).map(|sender| sender.value().clone())
    }

    pub fn remove(&self, id: &str) {
        self.active.remove(id);
    }

    // History

    pub fn append_history(&self, id: &str, command_type: &str, target: Option<&str>) {
        let now = self.now();
        let cap = self.settings.history_cap;
        let entry = HistoryEntry {
            timestamp: now,
            sender: id.to_string(),
            command_type: command_type.to_string(),
            target: target.map(str::to_string),
        };
        // append and truncate under the same shard lock
        self.history
            .entry(id.to_string())
            .or_insert_with(|| HistoryLog::new(id, now))
            .push(entry, cap);
    }

    pub fn get_history(&self, id: &str) -> Vec<HistoryEntry> {
        self.history
            .get(id)
            .map(|log| log.entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Distinct senders that appear anywhere in retained history
    pub fn recent_senders(&self) -> Vec<String> {
        let mut senders = BTreeSet::new();
        for log in self.history.iter() {
            for entry in log.entries.iter() {
                senders.insert(entry.sender.clone());
            }
        }
        senders.into_iter().collect()
    }

    // Rate windows

    /// Backing collection for the rate limiter's admission policy
    pub fn rate_windows(&self) -> &DashMap<String, RateWindow> {
        &self.rate_windows
    }

    // Reply cache

    /// Never returns an expired entry; an expired hit is evicted on the spot
    pub fn get_cached(&self, key: &str) -> Option<String> {
        let now = self.now();
        if self
            .cache
            .remove_if(key, |_, cached| cached.is_expired(now))
            .is_some()
        {
            debug!(key, "Evicted expired cache entry on read");
            return None;
        }
        self.cache
            .get(key)
            .filter(|cached| !cached.is_expired(now))
            .map(|cached| cached.value.clone())
    }

    pub fn set_cached(&self, key: &str, value: &str) {
        let now = self.now();
        self.cache.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value: value.to_string(),
                created_at: now,
                expires_at: now + self.settings.cache_ttl_millis(),
            },
        );
    }

    // Maintenance

    /// Evict everything whose expiry predicate holds at this instant
    pub fn sweep(&self) -> SweepReport {
        let now = self.now();
        let active_ttl = self.settings.active_user_ttl_millis();
        let conversation_ttl = self.settings.conversation_ttl_millis();
        let stale_window = self.settings.stale_rate_window_millis();
        let mut report = SweepReport::default();

        self.history.retain(|_, log| {
            let keep = !log.is_expired(now, conversation_ttl);
            if !keep {
                report.conversation_logs += 1;
            }
            keep
        });
        self.cache.retain(|_, cached| {
            let keep = !cached.is_expired(now);
            if !keep {
                report.cached_responses += 1;
            }
            keep
        });
        self.active.retain(|_, sender| {
            let keep = !sender.is_expired(now, active_ttl);
            if !keep {
                report.active_users += 1;
            }
            keep
        });
        self.rate_windows.retain(|_, window| {
            let keep = now - window.last_command_at <= stale_window;
            if !keep {
                report.rate_windows += 1;
            }
            keep
        });

        if report.conversation_logs > 0 {
            info!(count = report.conversation_logs, "Cleanup: conversation items removed");
        }
        if report.cached_responses > 0 {
            info!(count = report.cached_responses, "Cleanup: cache items removed");
        }
        if report.active_users > 0 {
            info!(count = report.active_users, "Cleanup: active-users items removed");
        }
        if report.rate_windows > 0 {
            debug!(count = report.rate_windows, "Cleanup: rate windows removed");
        }
        report
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            active_users: self.active.len(),
            conversation_logs: self.history.len(),
            rate_windows: self.rate_windows.len(),
            cached_responses: self.cache.len(),
        }
    }

    pub fn clear(&self) {
        self.active.clear();
        self.history.clear();
        self.rate_windows.clear();
        self.cache.clear();
    }
}
