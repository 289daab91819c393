//! Append-only audit trail of gateway calls

pub mod logger;
pub mod record;
pub mod sink;

pub use logger::AuditLogger;
pub use record::{AuditOutcome, AuditQuery, AuditRecord};
pub use sink::{AuditSink, JsonlAuditSink, MemoryAuditSink};
