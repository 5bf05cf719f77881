//! All Paths are recorded here for use throughout this codebase
pub mod base {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const ABOUT: &str = "/about";
}

pub mod messages {
    pub const WEBHOOK: &str = "/webhook/message";
    pub const HISTORY: &str = "/history/{sender}";
}

pub mod admin {
    pub const SWEEP: &str = "/admin/sweep";
}

/// Only routed when the test endpoint is switched on
pub mod dev {
    pub const TEST: &str = "/test";
}

/// Every route, as advertised by the root endpoint
pub const ALL: [&str; 6] = [
    base::ROOT,
    base::HEALTH,
    base::ABOUT,
    messages::WEBHOOK,
    messages::HISTORY,
    admin::SWEEP,
];

pub fn history_path(sender: &str) -> String {
    messages::HISTORY.replace("{sender}", sender)
}
