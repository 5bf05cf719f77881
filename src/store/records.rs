//! Entries held by the state store.
//!
//! All timestamps are epoch milliseconds taken from the store's clock.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A sender currently considered part of the simulated group
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActiveSender {
    pub id: String,
    pub last_active_at: i64,
    pub message_count: u64,
    pub last_command: Option<String>,
    pub joined_at: i64,
}

impl ActiveSender {
    pub fn new(id: &str, now: i64) -> Self {
        Self {
            id: id.to_string(),
            last_active_at: now,
            message_count: 0,
            last_command: None,
            joined_at: now,
        }
    }

    pub fn is_expired(&self, now: i64, ttl_ms: i64) -> bool {
        now - self.last_active_at > ttl_ms
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub timestamp: i64,
    pub sender: String,
    pub command_type: String,
    pub target: Option<String>,
}

/// Rolling per-sender log of recent commands (metadata only, never content).
///
/// `last_cleanup_at` is fixed at creation: the whole log expires on an
/// absolute timer regardless of later activity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryLog {
    pub id: String,
    pub entries: VecDeque<HistoryEntry>,
    pub last_cleanup_at: i64,
}

impl HistoryLog {
    pub fn new(id: &str, now: i64) -> Self {
        Self {
            id: id.to_string(),
            entries: VecDeque::new(),
            last_cleanup_at: now,
        }
    }

    /// Append and drop the oldest entries beyond `cap`
    pub fn push(&mut self, entry: HistoryEntry, cap: usize) {
        self.entries.push_back(entry);
        while self.entries.len() > cap {
            self.entries.pop_front();
        }
    }

    pub fn is_expired(&self, now: i64, ttl_ms: i64) -> bool {
        now - self.last_cleanup_at > ttl_ms
    }
}

/// Fixed admission window for one sender
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateWindow {
    pub id: String,
    pub window_start: i64,
    pub last_command_at: i64,
    pub count: u32,
}

impl RateWindow {
    /// A window that has just admitted its first command
    pub fn open(id: &str, now: i64) -> Self {
        Self {
            id: id.to_string(),
            window_start: now,
            last_command_at: now,
            count: 1,
        }
    }

    /// True once `last_command_at` falls before `now - window_ms`
    pub fn has_elapsed(&self, now: i64, window_ms: i64) -> bool {
        self.last_command_at < now - window_ms
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
