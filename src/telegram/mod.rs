//! Telegram bot integration and handlers

pub mod announcements;
pub mod bot;
pub mod broadcast;
pub mod schema;
pub mod start;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
