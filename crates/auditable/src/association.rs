//! Associations
//!
//! Declared relationships of a model type. Audited types declare one
//! has-many association to their audits through a polymorphic reference.

use auditable_config::{AssociationConfig, OrderColumn, SortDirection};
use std::sync::Arc;

use crate::audit::{Audit, AuditOrder, AuditStore, NewAudit};
use crate::error::Result;
use crate::model::AuditableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    HasMany,
}

/// Declaration of one association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSpec {
    pub name: String,
    pub kind: AssociationKind,
    /// Polymorphic back-reference name on the associated side
    pub polymorphic_as: Option<String>,
    pub order_column: OrderColumn,
    pub order_direction: SortDirection,
}

impl AssociationSpec {
    /// `has_many :audits, as: :auditable, order: "created_at DESC"`
    pub fn audits(config: &AssociationConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind: AssociationKind::HasMany,
            polymorphic_as: Some(config.polymorphic_as.clone()),
            order_column: config.order_column,
            order_direction: config.order_direction,
        }
    }

    /// Ordering clause, e.g. "created_at DESC"
    pub fn order(&self) -> String {
        let direction = match self.order_direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        format!("{} {}", self.order_column, direction)
    }

    pub fn audit_order(&self) -> AuditOrder {
        AuditOrder::new(self.order_column, self.order_direction)
    }
}

/// The audits association bound to a store
pub struct AuditsAssociation {
    spec: AssociationSpec,
    store: Arc<dyn AuditStore>,
}

impl AuditsAssociation {
    pub fn new(spec: AssociationSpec, store: Arc<dyn AuditStore>) -> Self {
        Self { spec, store }
    }

    pub fn spec(&self) -> &AssociationSpec {
        &self.spec
    }

    pub async fn create(
        &self,
        owner: AuditableRef,
        message: String,
        auditor: Option<String>,
    ) -> Result<Audit> {
        self.store.create(NewAudit::new(owner, message, auditor)).await
    }

    pub async fn load(&self, owner: &AuditableRef) -> Result<Vec<Audit>> {
        self.store.find_for(owner, self.spec.audit_order()).await
    }
}
