//! Keyword command recognition
use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Word that must appear somewhere in a message for it to be a command
pub const TRIGGER_WORD: &str = "buddi";

pub const DEFAULT_ROAST_TARGET: &str = "someone";
pub const DEFAULT_SCENARIO: &str = "do something embarrassing";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandType {
    Roast,
    TruthOrDare,
    Advice,
    Summarize,
    MostLikelyTo,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Roast => "roast",
            CommandType::TruthOrDare => "truth-or-dare",
            CommandType::Advice => "advice",
            CommandType::Summarize => "summarize",
            CommandType::MostLikelyTo => "most-likely-to",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roast" => Ok(CommandType::Roast),
            "truth-or-dare" => Ok(CommandType::TruthOrDare),
            "advice" => Ok(CommandType::Advice),
            "summarize" => Ok(CommandType::Summarize),
            "most-likely-to" => Ok(CommandType::MostLikelyTo),
            _ => Err(format!("Invalid command type: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedCommand {
    pub command: CommandType,
    pub target: Option<String>,
}

impl ParsedCommand {
    fn new(command: CommandType, target: Option<String>) -> Self {
        Self { command, target }
    }
}

pub trait CommandParser: Debug + Send + Sync {
    /// `None` when the text is not a command this bot understands
    fn parse(&self, text: &str) -> Option<ParsedCommand>;
}

/// Matches on the trigger word plus a keyword per command.
///
/// Commands are tried in a fixed order (roast, truth or dare, advice,
/// summarize, most likely to) and the first match wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordParser;

impl CommandParser for KeywordParser {
    fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let normalized = text.trim().to_lowercase();
        if !normalized.contains(TRIGGER_WORD) {
            return None;
        }
        let words: Vec<&str> = normalized.split_whitespace().collect();

        parse_roast(&normalized, &words)
            .or_else(|| parse_truth_or_dare(&normalized))
            .or_else(|| parse_advice(&normalized, &words))
            .or_else(|| parse_summarize(&normalized))
            .or_else(|| parse_most_likely(&normalized))
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Words following the first word that starts with `keyword`
fn words_after<'a>(words: &[&'a str], keyword: &str) -> Option<Vec<&'a str>> {
    words
        .iter()
        .position(|word| word.starts_with(keyword))
        .map(|idx| words[idx + 1..].to_vec())
}

fn parse_roast(text: &str, words: &[&str]) -> Option<ParsedCommand> {
    if !contains_any(text, &["roast"]) {
        return None;
    }
    let target = words_after(words, "roast")
        .and_then(|rest| rest.first().map(|w| w.to_string()))
        .unwrap_or_else(|| DEFAULT_ROAST_TARGET.to_string());
    Some(ParsedCommand::new(CommandType::Roast, Some(target)))
}

fn parse_truth_or_dare(text: &str) -> Option<ParsedCommand> {
    contains_any(text, &["truth", "dare"])
        .then(|| ParsedCommand::new(CommandType::TruthOrDare, None))
}

fn parse_advice(text: &str, words: &[&str]) -> Option<ParsedCommand> {
    if !contains_any(text, &["advice", "advise", "help"]) {
        return None;
    }
    // "advice about X" / "advice on X"
    let topic = words_after(words, "advice").and_then(|rest| {
        let marker = rest.iter().position(|w| *w == "about" || *w == "on")?;
        let topic = rest[marker + 1..].join(" ");
        (!topic.is_empty()).then_some(topic)
    });
    Some(ParsedCommand::new(CommandType::Advice, topic))
}

fn parse_summarize(text: &str) -> Option<ParsedCommand> {
    contains_any(text, &["summarize", "summary", "what did i miss", "catch me up"])
        .then(|| ParsedCommand::new(CommandType::Summarize, None))
}

fn parse_most_likely(text: &str) -> Option<ParsedCommand> {
    if !text.contains("most likely") {
        return None;
    }
    let scenario = text
        .find("most likely to")
        .map(|idx| text[idx + "most likely to".len()..].trim())
        .filter(|rest| !rest.is_empty())
        .unwrap_or(DEFAULT_SCENARIO);
    Some(ParsedCommand::new(
        CommandType::MostLikelyTo,
        Some(scenario.to_string()),
    ))
}
