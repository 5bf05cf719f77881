//! Shared fixtures for integration tests
#![allow(dead_code)]
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use buddi::clock::ManualClock;
use buddi::error::{BuddiError, Result};
use buddi::settings::StoreSettings;
use buddi::store::StateStore;
use buddi::transport::Transport;

/// Remembers every attempt and every successful delivery. Recipients in
/// `failing` get a transport error; recipients in `delays` answer late.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    fail_all: bool,
}

impl RecordingTransport {
    pub fn failing_everyone() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn delay_for(&self, recipient: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(recipient.to_string(), delay);
    }

    pub fn attempts_for(&self, recipient: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|to| *to == recipient)
            .count()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(recipient.to_string());
        let delay = self.delays.lock().unwrap().get(recipient).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all || self.failing.lock().unwrap().contains(recipient) {
            return Err(BuddiError::Transport(format!("{} unreachable", recipient)));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn store_at(start: i64) -> (Arc<StateStore>, ManualClock) {
    let clock = ManualClock::new(start);
    let store = StateStore::with_clock(StoreSettings::default(), Arc::new(clock.clone()));
    (Arc::new(store), clock)
}
