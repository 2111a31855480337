//! Auditable
//!
//! Audit logging for model types. A type registers audit rules on its
//! [`ModelDefinition`]; each rule names a lifecycle event, a condition and a
//! message. When the event fires and the condition holds, an [`Audit`] is
//! recorded with the message and the instance's current auditor.
//!
//! Once a type has a rule, saving an instance requires its `auditor` to be
//! set whenever any rule's condition holds.
//!
//! ## Module Organization
//!
//! - `definition` - per-type registry object and save lifecycle
//! - `options` / `dispatch` / `registry` - audit rules
//! - `callbacks` / `validation` / `association` - host surface rules attach to
//! - `audit` - audit entity and stores

pub mod association;
pub mod audit;
pub mod auditing;
pub mod callbacks;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod options;
pub mod registry;
pub mod validation;

pub use association::{AssociationKind, AssociationSpec, AuditsAssociation};
pub use audit::{connect, Audit, AuditOrder, AuditStore, MemoryAuditStore, NewAudit};
pub use callbacks::{CallbackChain, FnListener, LifecycleListener};
pub use definition::{AuditSettings, ModelDefinition};
pub use dispatch::{Condition, MessageSource};
pub use error::{AuditError, Result};
pub use lifecycle::{LifecycleEvent, Persistence};
pub use model::{Auditable, AuditableRef, Model};
pub use options::AuditOptions;
pub use registry::{AuditKey, AuditRegistration, AuditRegistry};
pub use validation::{Errors, ValidationContext, Validator};

#[cfg(feature = "sqlite")]
pub use audit::SqliteAuditStore;

pub use auditable_config::{
    AuditConfig, AuditorPolicy, LoggingConfig, OrderColumn, RuleConfig, SortDirection, StoreConfig,
};
