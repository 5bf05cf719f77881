pub mod api;
pub mod bot;
pub mod broadcast;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod error;
pub mod limiters;
pub mod replies;
pub mod settings;
pub mod store;
pub mod transport;
