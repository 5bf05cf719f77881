//! Reply generation
//!
//! `CannedReplyGenerator` renders a fixed template per command and keeps the
//! result in the shared reply cache, the same way a model-backed generator
//! would avoid paying for an identical request twice.
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::commands::{CommandType, DEFAULT_ROAST_TARGET, DEFAULT_SCENARIO};
use crate::error::Result;
use crate::store::StateStore;

/// Fixed user-facing texts sent when there is no generated reply
pub mod fallback {
    pub const UNKNOWN_COMMAND: &str = "I can roast people, play truth or dare, give advice, summarize convos, or play 'most likely to' - what sounds fun? 🤖";
    pub const EMPTY_MESSAGE: &str =
        "Did you mean to text me? Try 'buddi roast [name]' or 'buddi truth or dare' 😅";
    pub const API_FAILURE: &str = "My brain is buffering... try again in a sec 🤖";
    pub const RATE_LIMIT: &str = "Chill, let me catch up! ⚡";
    pub const NO_HISTORY: &str = "I just got here, catch me up! 👋";
}

/// History entries considered by a summary
const SUMMARY_WINDOW: usize = 5;

#[async_trait]
pub trait ReplyGenerator: Debug + Send + Sync {
    async fn generate(
        &self,
        command: CommandType,
        target: Option<&str>,
        sender: &str,
    ) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct CannedReplyGenerator {
    cache: ResponseCache,
    store: Arc<StateStore>,
}

impl CannedReplyGenerator {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            cache: ResponseCache::new(store.clone()),
            store,
        }
    }

    fn render(command: CommandType, target: Option<&str>) -> String {
        match command {
            CommandType::Roast => format!(
                "{} really walks around with the confidence of someone who peaked in middle school 💀",
                target.unwrap_or(DEFAULT_ROAST_TARGET)
            ),
            CommandType::TruthOrDare => {
                "DARE: Change your name in this chat to 'Professional Disappointment' for the next hour 😈"
                    .to_string()
            }
            CommandType::Advice => match target {
                Some(topic) => format!(
                    "Advice on {}? Stop overthinking it and just do it. Worst case you get a funny story 🤷",
                    topic
                ),
                None => "Stop overthinking and just do it. Worst case you get a funny story 🤷"
                    .to_string(),
            },
            CommandType::MostLikelyTo => format!(
                "Most likely to {}? Everyone here already knows who it is 👀",
                target.unwrap_or(DEFAULT_SCENARIO)
            ),
            // built from per-sender history in `summarize`, never rendered here
            CommandType::Summarize => fallback::NO_HISTORY.to_string(),
        }
    }

    fn summarize(&self, sender: &str) -> String {
        let history = self.store.get_history(sender);
        if history.is_empty() {
            return fallback::NO_HISTORY.to_string();
        }
        let skip = history.len().saturating_sub(SUMMARY_WINDOW);
        let recent: Vec<String> = history[skip..]
            .iter()
            .map(|entry| match &entry.target {
                Some(target) => format!("{} ({})", entry.command_type, target),
                None => entry.command_type.clone(),
            })
            .collect();
        format!("Previously on this chat: {}. You're welcome 📺", recent.join(", "))
    }
}

#[async_trait]
impl ReplyGenerator for CannedReplyGenerator {
    async fn generate(
        &self,
        command: CommandType,
        target: Option<&str>,
        sender: &str,
    ) -> Result<String> {
        if command == CommandType::Summarize {
            return Ok(self.summarize(sender));
        }
        if let Some(cached) = self.cache.get(command.as_str(), target) {
            debug!(command = command.as_str(), "Serving reply from cache");
            return Ok(cached);
        }
        let reply = Self::render(command, target);
        self.cache.put(command.as_str(), target, &reply);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::StoreSettings;

    fn generator() -> (CannedReplyGenerator, Arc<StateStore>) {
        let store = Arc::new(StateStore::new(StoreSettings::default()));
        (CannedReplyGenerator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn replies_are_cached_across_senders() {
        let (generator, store) = generator();
        let first = generator
            .generate(CommandType::Roast, Some("Bob"), "+15550000001")
            .await
            .unwrap();
        assert!(first.starts_with("Bob"));
        assert_eq!(store.stats().cached_responses, 1);

        // "bob" hits the entry created for "Bob"
        let second = generator
            .generate(CommandType::Roast, Some("bob"), "+15550000002")
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.stats().cached_responses, 1);
    }

    #[tokio::test]
    async fn summary_uses_last_five_entries() {
        let (generator, store) = generator();
        let empty = generator
            .generate(CommandType::Summarize, None, "a")
            .await
            .unwrap();
        assert_eq!(empty, fallback::NO_HISTORY);

        for n in 0..7 {
            store.append_history("a", "roast", Some(format!("p{}", n).as_str()));
        }
        let summary = generator
            .generate(CommandType::Summarize, None, "a")
            .await
            .unwrap();
        assert!(!summary.contains("(p1)"));
        assert!(summary.contains("roast (p2)"));
        assert!(summary.contains("roast (p6)"));
        assert_eq!(store.stats().cached_responses, 0);
    }
}
