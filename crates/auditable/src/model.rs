//! Model Traits
//!
//! What a model type exposes to its definition: identity, named-method
//! lookup and, once audited, the transient `auditor` attribute.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted model type.
pub trait Model: Send + Sync + 'static {
    /// Type tag stored on polymorphic references (e.g. "Article")
    fn model_name() -> &'static str;

    /// Primary key, `None` until the record is first saved
    fn id(&self) -> Option<String>;

    /// Called by the save driver when a new record is created
    fn assign_id(&mut self, id: String);

    fn is_new_record(&self) -> bool {
        self.id().is_none()
    }

    /// Look up a method by name and return its result.
    ///
    /// Returns `None` when the model has no method of that name.
    fn invoke(&self, _method: &str) -> Option<Value> {
        None
    }
}

/// A model that can carry audit rules.
pub trait Auditable: Model {
    /// The actor responsible for the change about to be saved. Not persisted.
    fn auditor(&self) -> Option<&str>;

    fn set_auditor(&mut self, auditor: Option<String>);
}

/// Polymorphic back-reference from an audit to the record that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditableRef {
    pub auditable_type: String,
    pub auditable_id: Option<String>,
}

impl AuditableRef {
    pub fn new(auditable_type: impl Into<String>, auditable_id: Option<String>) -> Self {
        Self {
            auditable_type: auditable_type.into(),
            auditable_id,
        }
    }

    pub fn of<M: Model>(model: &M) -> Self {
        Self::new(M::model_name(), model.id())
    }
}
