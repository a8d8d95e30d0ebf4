//! Движок рассылок: staging креативов, отбор аудитории, чанкование и
//! доставка с изоляцией ошибок по получателям.

pub mod audience;
pub mod creative;
pub mod dispatcher;
pub mod engine;
pub mod scheduler;
pub mod staging;
pub mod transport;

// Re-exports for convenience
pub use audience::{AudienceStore, BroadcastRole, Recipient, SqliteAudienceStore};
pub use creative::{split_text, Creative};
pub use dispatcher::{dispatch_chunk, ChunkOutcome, DeliveryOutcome};
pub use engine::{run_broadcast, BroadcastReport};
pub use scheduler::{estimate_duration_secs, schedule};
pub use staging::CreativeStaging;
pub use transport::BroadcastTransport;
