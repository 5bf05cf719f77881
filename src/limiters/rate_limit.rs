use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::settings;
use crate::store::{RateWindow, StateStore};

/// Fixed-window admission gate for senders.
///
/// Windows live in the state store's rate-window collection; every decision
/// is made inside a single `entry` call so two near-simultaneous events for
/// the same sender can never both slip through.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    settings: settings::RateLimitSettings,
    store: Arc<StateStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            settings: store.settings().rate_limit.clone(),
            store,
        }
    }

    /// Admit or reject one command for this sender.
    ///
    /// An absent or elapsed window is replaced by a fresh one holding this
    /// command. Inside a live window the command is rejected once `count`
    /// has reached the cap; a rejection leaves the window untouched.
    pub fn check_and_consume(&self, id: &str) -> bool {
        let now = self.store.now();
        let window_ms = self.settings.window_millis();
        let cap = self.settings.max_commands;

        match self.store.rate_windows().entry(id.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateWindow::open(id, now));
                true
            }
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();
                if window.has_elapsed(now, window_ms) {
                    *window = RateWindow::open(id, now);
                    true
                } else if window.count >= cap {
                    debug!(sender = id, count = window.count, "Rate limit hit");
                    false
                } else {
                    window.count += 1;
                    window.last_command_at = now;
                    true
                }
            }
        }
    }

    /// Push the window's `last_command_at` forward once a cycle has completed
    pub fn mark_completed(&self, id: &str) {
        let now = self.store.now();
        if let Some(mut window) = self.store.rate_windows().get_mut(id) {
            window.last_command_at = now;
        }
    }

    pub fn window(&self, id: &str) -> Option<RateWindow> {
        self.store
            .rate_windows()
            .get(id)
            .map(|window| window.value().clone())
    }

    pub fn len(&self) -> usize {
        self.store.rate_windows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.rate_windows().is_empty()
    }
}
