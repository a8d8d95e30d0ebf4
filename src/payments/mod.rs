//! Prodamus payment webhook: signature check, persistence, user notification

pub mod server;
pub mod signature;

// Re-exports for convenience
pub use server::{run_webhook_server, PaymentMethod};
pub use signature::{compute_signature, verify_signature};
