use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::paths;
use crate::bot::Bot;
use crate::broadcast::{FrozenBroadcastStats, GroupStats};
use crate::cli::{APP_NAME, APP_VERSION};
use crate::store::StoreStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

pub async fn root() -> axum::Json<RootResponse> {
    axum::Json(RootResponse {
        message: "Buddi is running".to_string(),
        version: APP_VERSION.to_string(),
        endpoints: paths::ALL.iter().map(|p| p.to_string()).collect(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub stats: StoreStats,
    pub group: GroupStats,
    pub broadcasts: FrozenBroadcastStats,
}

#[instrument(skip(bot), level = "debug")]
pub async fn health(State(bot): State<Bot>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        stats: bot.stats(),
        group: bot.group_stats(),
        broadcasts: bot.broadcast_stats(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct AboutResponse {
    name: String,
    version: String,
}

impl Default for AboutResponse {
    fn default() -> Self {
        Self {
            name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
        }
    }
}

#[instrument]
pub async fn about() -> axum::Json<AboutResponse> {
    axum::Json(AboutResponse::default())
}
