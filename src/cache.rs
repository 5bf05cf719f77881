//! Reply cache shared by every sender.
//!
//! Replies are generic content, so a roast of "Bob" generated for one sender
//! is served to anyone else asking for the same thing until it expires.
use std::sync::Arc;

use tracing::debug;

use crate::store::StateStore;

/// `command` alone, or `command_target` with the target lower-cased and
/// each whitespace run collapsed to `_`
pub fn derive_key(command_type: &str, target: Option<&str>) -> String {
    match target.filter(|t| !t.is_empty()) {
        Some(target) => {
            let normalized = collapse_whitespace(&target.to_lowercase());
            format!("{}_{}", command_type, normalized)
        }
        None => command_type.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[derive(Clone, Debug)]
pub struct ResponseCache {
    store: Arc<StateStore>,
}

impl ResponseCache {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, command_type: &str, target: Option<&str>) -> Option<String> {
        let key = derive_key(command_type, target);
        let hit = self.store.get_cached(&key);
        debug!(key = key.as_str(), hit = hit.is_some(), "Cache lookup");
        hit
    }

    pub fn put(&self, command_type: &str, target: Option<&str>, value: &str) {
        let key = derive_key(command_type, target);
        self.store.set_cached(&key, value);
    }
}
