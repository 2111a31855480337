//! Audit listener and auditor presence validation

use async_trait::async_trait;
use auditable_config::AuditorPolicy;
use std::sync::Arc;
use tracing::{debug, info};

use crate::association::AuditsAssociation;
use crate::callbacks::LifecycleListener;
use crate::error::{AuditError, Result};
use crate::lifecycle::Persistence;
use crate::model::{Auditable, AuditableRef};
use crate::registry::{AuditKey, AuditRegistry};
use crate::validation::{Errors, ValidationCondition, ValidationContext, Validator};

pub const AUDITOR_FIELD: &str = "auditor";

/// True iff any registered condition holds for `model`
pub fn any_rule_applies<M: Auditable>(registry: &AuditRegistry<M>, model: &M) -> Result<bool> {
    for registration in registry.snapshot() {
        if registration.condition.evaluate(model)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Like [`any_rule_applies`], restricted to rules whose event is still to
/// fire during a save of kind `persistence`
pub fn upcoming_rule_applies<M: Auditable>(
    registry: &AuditRegistry<M>,
    model: &M,
    persistence: Persistence,
) -> Result<bool> {
    for registration in registry.snapshot() {
        if persistence.is_upcoming(registration.when) && registration.condition.evaluate(model)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Bound to the event of one registration; records an audit when the
/// registration's condition holds.
pub struct AuditListener<M> {
    key: AuditKey,
    registry: Arc<AuditRegistry<M>>,
    audits: Arc<AuditsAssociation>,
}

impl<M> AuditListener<M> {
    pub fn new(
        key: AuditKey,
        registry: Arc<AuditRegistry<M>>,
        audits: Arc<AuditsAssociation>,
    ) -> Self {
        Self { key, registry, audits }
    }
}

#[async_trait]
impl<M: Auditable> LifecycleListener<M> for AuditListener<M> {
    async fn call(&self, model: &M) -> Result<()> {
        let registration = self
            .registry
            .find(&self.key)
            .ok_or_else(|| AuditError::RegistrationNotFound {
                key: self.key.to_string(),
            })?;

        if !registration.condition.evaluate(model)? {
            debug!(
                model = M::model_name(),
                event = %registration.when,
                key = %self.key,
                "Audit condition false, skipping"
            );
            return Ok(());
        }

        let message = registration.message.produce(model)?;
        let auditor = model.auditor().map(String::from);
        let audit = self
            .audits
            .create(AuditableRef::of(model), message, auditor)
            .await?;

        info!(
            audit_id = %audit.id,
            auditable_type = %audit.auditable_type,
            auditable_id = ?audit.auditable_id,
            auditor = ?audit.auditor,
            event = %registration.when,
            "Audit recorded"
        );
        Ok(())
    }
}

/// Requires `auditor` to be set. Registered conditionally on the policy's
/// "will be audited" check, so it only adds its error when reached.
pub struct AuditorPresence {
    message: String,
}

impl AuditorPresence {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl<M: Auditable> Validator<M> for AuditorPresence {
    fn validate(&self, model: &M, _ctx: &ValidationContext, errors: &mut Errors) -> Result<()> {
        if model.auditor().is_none() {
            errors.add(AUDITOR_FIELD, self.message.clone());
        }
        Ok(())
    }
}

/// The condition the auditor validation runs under
pub fn will_be_audited_condition<M: Auditable>(
    registry: Arc<AuditRegistry<M>>,
    policy: AuditorPolicy,
) -> ValidationCondition<M> {
    Arc::new(move |model: &M, ctx: &ValidationContext| -> Result<bool> {
        match policy {
            AuditorPolicy::AnyRule => any_rule_applies(&registry, model),
            AuditorPolicy::UpcomingEvents => {
                upcoming_rule_applies(&registry, model, ctx.persistence)
            }
        }
    })
}
