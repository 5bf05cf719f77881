use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    Form,
};
use serde::{Deserialize, Serialize};
use tracing::{event, instrument, Level};

use crate::api_error;
use crate::bot::{normalize_sender, Bot, InboundOutcome};
use crate::error::{BuddiError, Result};
use crate::store::{HistoryEntry, SweepReport};

/// Inbound SMS webhook body
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InboundMessage {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

#[instrument(skip(bot, form), level = "debug")]
pub async fn receive(
    State(bot): State<Bot>,
    Form(form): Form<InboundMessage>,
) -> Result<(StatusCode, &'static str)> {
    // both fields are checked before the sender's window is touched
    let from = form
        .from
        .ok_or_else(|| api_error!("missing required field From"))?;
    let body = form
        .body
        .ok_or_else(|| api_error!("missing required field Body"))?;

    respond(bot.handle_message(&from, &body).await)
}

/// Development-only stand-in for the SMS webhook, taking JSON instead of a form
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMessage {
    pub message: Option<String>,
    pub phone_number: Option<String>,
}

#[instrument(skip(bot, payload), level = "debug")]
pub async fn test_message(
    State(bot): State<Bot>,
    axum::Json(payload): axum::Json<TestMessage>,
) -> Result<(StatusCode, &'static str)> {
    let (message, phone_number) = match (payload.message, payload.phone_number) {
        (Some(message), Some(phone_number)) if !message.is_empty() => (message, phone_number),
        _ => return Err(api_error!("missing message or phone number")),
    };
    respond(bot.handle_message(&phone_number, &message).await)
}

fn respond(outcome: InboundOutcome) -> Result<(StatusCode, &'static str)> {
    let response = match outcome {
        InboundOutcome::InvalidSender => {
            return Err(api_error!("invalid phone number format"));
        }
        InboundOutcome::RateLimited => (StatusCode::OK, "Rate limited"),
        InboundOutcome::EmptyMessage => (StatusCode::OK, "Empty message"),
        InboundOutcome::UnknownCommand => (StatusCode::OK, "Unknown command"),
        InboundOutcome::GenerationTimedOut => (StatusCode::OK, "Reply timed out"),
        InboundOutcome::Delivered(_) => (StatusCode::OK, "Message sent to group"),
        InboundOutcome::BroadcastFailed(cycle) => {
            event!(
                Level::ERROR,
                message = "Broadcast failed",
                cycle = format!("{:?}", cycle)
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Broadcast failed")
        }
    };
    Ok(response)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub sender: String,
    pub entries: Vec<HistoryEntry>,
}

/// The sender may be given raw or already normalized
#[instrument(skip(bot), level = "debug")]
pub async fn history(
    Path(sender): Path<String>,
    State(bot): State<Bot>,
) -> Result<axum::Json<HistoryResponse>> {
    let sender = normalize_sender(&sender)
        .ok_or_else(|| api_error!("invalid phone number format"))?;
    let entries = bot.history(&sender);
    Ok(axum::Json(HistoryResponse { sender, entries }))
}

#[instrument(skip(bot), level = "debug")]
pub async fn sweep(State(bot): State<Bot>) -> axum::Json<SweepReport> {
    axum::Json(bot.sweep())
}

pub async fn not_found(uri: Uri) -> BuddiError {
    BuddiError::NotFound(uri.path().to_string())
}
