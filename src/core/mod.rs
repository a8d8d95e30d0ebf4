//! Core utilities: configuration, errors, logging and common helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_startup_configuration};
pub use utils::escape_markdown_v2;
