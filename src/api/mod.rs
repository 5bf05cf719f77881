mod base;
mod messages;

use std::borrow::Cow;

use axum::{
    error_handling::HandleErrorLayer, http::StatusCode, response::IntoResponse, routing, Router,
};
use tokio::time::Duration;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;

pub mod paths;

pub use base::{AboutResponse, HealthResponse, RootResponse};
pub use messages::{HistoryResponse, InboundMessage, TestMessage};

use crate::bot::Bot;
use crate::error::Result;

/// Build the HTTP API around a bot; `test_endpoint` adds the JSON `/test` route
pub fn api(bot: Bot, test_endpoint: bool) -> Result<Router> {
    let mut api = Router::new()
        .route(paths::base::ROOT, routing::get(base::root))
        .route(paths::base::HEALTH, routing::get(base::health))
        .route(paths::base::ABOUT, routing::get(base::about))
        // Inbound messages and their history
        .route(paths::messages::WEBHOOK, routing::post(messages::receive))
        .route(paths::messages::HISTORY, routing::get(messages::history))
        .route(paths::admin::SWEEP, routing::post(messages::sweep));
    if test_endpoint {
        api = api.route(paths::dev::TEST, routing::post(messages::test_message));
    }

    let api = api
        .fallback(messages::not_found)
        .layer(
            ServiceBuilder::new()
                // Handle errors from middleware
                .layer(HandleErrorLayer::new(handle_error))
                .load_shed()
                .timeout(Duration::from_secs(10)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(bot);

    Ok(api)
}

async fn handle_error(error: BoxError) -> impl IntoResponse {
    if error.is::<tower::timeout::error::Elapsed>() {
        return (StatusCode::REQUEST_TIMEOUT, Cow::from("request timed out"));
    }

    if error.is::<tower::load_shed::error::Overloaded>() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Cow::from("service is overloaded, try again later"),
        );
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Cow::from(format!("Unhandled internal error: {}", error)),
    )
}
