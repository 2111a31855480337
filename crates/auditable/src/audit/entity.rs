//! Audit Entity
//!
//! One recorded message about a change to an audited record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::AuditableRef;

/// A persisted audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: String,

    pub message: String,

    /// Actor responsible for the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auditor: Option<String>,

    /// Type tag of the audited record (e.g. "Article")
    pub auditable_type: String,

    /// `None` when the record had no id yet, e.g. audits fired before create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auditable_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Audit {
    pub fn auditable(&self) -> AuditableRef {
        AuditableRef::new(self.auditable_type.clone(), self.auditable_id.clone())
    }

    pub fn belongs_to(&self, owner: &AuditableRef) -> bool {
        self.auditable_type == owner.auditable_type && self.auditable_id == owner.auditable_id
    }
}

/// Attributes for a new audit entry, scoped to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAudit {
    pub auditable: AuditableRef,
    pub message: String,
    pub auditor: Option<String>,
}

impl NewAudit {
    pub fn new(
        auditable: AuditableRef,
        message: impl Into<String>,
        auditor: Option<String>,
    ) -> Self {
        Self {
            auditable,
            message: message.into(),
            auditor,
        }
    }

    /// Stamp an id and creation time
    pub fn into_audit(self) -> Audit {
        Audit {
            id: uuid::Uuid::new_v4().to_string(),
            message: self.message,
            auditor: self.auditor,
            auditable_type: self.auditable.auditable_type,
            auditable_id: self.auditable.auditable_id,
            created_at: Utc::now(),
        }
    }
}
