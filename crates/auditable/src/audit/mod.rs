//! Audit Aggregate
//!
//! Audit entries and the stores that persist them.

pub mod entity;
pub mod repository;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use entity::{Audit, NewAudit};
pub use repository::{connect, AuditOrder, AuditStore, MemoryAuditStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteAuditStore;
