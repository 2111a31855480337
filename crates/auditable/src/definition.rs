//! Model Definition
//!
//! The per-type object a model's callbacks, validations, associations and
//! audit rules are attached to. Build one per model type at startup and
//! share it (`Arc`, `LazyLock`); every method takes `&self`.
//!
//! ```ignore
//! let articles = ModelDefinition::<Article>::new(store);
//! articles.audit(
//!     AuditOptions::new(LifecycleEvent::BeforeUpdate)
//!         .condition(Condition::named("published?"))
//!         .message(MessageSource::named("publish_message")),
//! )?;
//!
//! article.set_auditor(Some("alice".into()));
//! articles.save(&mut article).await?;
//! ```

use auditable_config::{AssociationConfig, AuditConfig, AuditorPolicy};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::association::{AssociationSpec, AuditsAssociation};
use crate::audit::{Audit, AuditStore};
use crate::auditing::{self, AuditListener, AuditorPresence};
use crate::callbacks::{CallbackChain, LifecycleListener};
use crate::dispatch::{Condition, MessageSource};
use crate::error::{AuditError, Result};
use crate::lifecycle::{LifecycleEvent, Persistence};
use crate::model::{Auditable, AuditableRef, Model};
use crate::options::AuditOptions;
use crate::registry::{AuditKey, AuditRegistry};
use crate::validation::{Errors, ValidationCondition, ValidationContext, Validator, ValidatorSet};

/// Settings applied when a type first becomes auditable
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub auditor_message: String,
    pub policy: AuditorPolicy,
    pub association: AssociationConfig,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self::from(&AuditConfig::default())
    }
}

impl From<&AuditConfig> for AuditSettings {
    fn from(config: &AuditConfig) -> Self {
        Self {
            auditor_message: config.validation.auditor_message.clone(),
            policy: config.validation.policy,
            association: config.association.clone(),
        }
    }
}

pub struct ModelDefinition<M> {
    callbacks: CallbackChain<M>,
    validators: ValidatorSet<M>,
    associations: RwLock<Vec<AssociationSpec>>,
    registry: Arc<AuditRegistry<M>>,
    audits: OnceLock<Arc<AuditsAssociation>>,
    store: Arc<dyn AuditStore>,
    settings: AuditSettings,
}

impl<M: Model> ModelDefinition<M> {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::with_settings(store, AuditSettings::default())
    }

    pub fn with_settings(store: Arc<dyn AuditStore>, settings: AuditSettings) -> Self {
        Self {
            callbacks: CallbackChain::new(),
            validators: ValidatorSet::new(),
            associations: RwLock::new(Vec::new()),
            registry: Arc::new(AuditRegistry::new()),
            audits: OnceLock::new(),
            store,
            settings,
        }
    }

    pub fn name(&self) -> &'static str {
        M::model_name()
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Bind a listener to a lifecycle event
    pub fn on(&self, event: LifecycleEvent, listener: Arc<dyn LifecycleListener<M>>) {
        self.callbacks.register(event, listener);
    }

    pub fn validate_with(&self, validator: Arc<dyn Validator<M>>) {
        self.validators.register(validator);
    }

    pub fn validate_with_if(
        &self,
        validator: Arc<dyn Validator<M>>,
        condition: ValidationCondition<M>,
    ) {
        self.validators.register_if(validator, condition);
    }

    pub fn associations(&self) -> Vec<AssociationSpec> {
        self.associations.read().clone()
    }

    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        self.callbacks.listener_count(event)
    }

    /// Run the validators for the save `model` would go through next
    pub fn validate(&self, model: &M) -> Result<Errors> {
        self.validators.run(model, &ValidationContext::new(persistence_of(model)))
    }

    /// Fire a single lifecycle event
    pub async fn fire(&self, event: LifecycleEvent, model: &M) -> Result<()> {
        self.callbacks.run(event, model).await
    }

    /// Validate and save `model`, firing the save lifecycle.
    ///
    /// A failed validation returns [`AuditError::Invalid`] before any
    /// save callback runs; the instance is left as it was.
    pub async fn save(&self, model: &mut M) -> Result<()> {
        let persistence = persistence_of(model);

        self.callbacks.run(LifecycleEvent::BeforeValidation, model).await?;
        let errors = self.validators.run(model, &ValidationContext::new(persistence))?;
        if !errors.is_empty() {
            debug!(model = M::model_name(), errors = ?errors.full_messages(), "Validation failed");
            return Err(AuditError::Invalid {
                model: M::model_name().to_string(),
                errors,
            });
        }
        self.callbacks.run(LifecycleEvent::AfterValidation, model).await?;

        self.callbacks.run(LifecycleEvent::BeforeSave, model).await?;
        match persistence {
            Persistence::Create => {
                self.callbacks.run(LifecycleEvent::BeforeCreate, model).await?;
                model.assign_id(uuid::Uuid::new_v4().to_string());
                self.callbacks.run(LifecycleEvent::AfterCreate, model).await?;
            }
            Persistence::Update => {
                self.callbacks.run(LifecycleEvent::BeforeUpdate, model).await?;
                self.callbacks.run(LifecycleEvent::AfterUpdate, model).await?;
            }
        }
        self.callbacks.run(LifecycleEvent::AfterSave, model).await?;

        debug!(model = M::model_name(), id = ?model.id(), ?persistence, "Saved");
        Ok(())
    }

    /// Fire the destroy lifecycle for `model`
    pub async fn destroy(&self, model: &M) -> Result<()> {
        self.callbacks.run(LifecycleEvent::BeforeDestroy, model).await?;
        self.callbacks.run(LifecycleEvent::AfterDestroy, model).await?;
        Ok(())
    }
}

impl<M: Auditable> ModelDefinition<M> {
    /// Register an audit rule.
    ///
    /// The first successful call makes the type auditable: it declares the
    /// audits association and the auditor presence validation. Every call
    /// appends one registration and binds one listener to its event.
    ///
    /// Rules on `before_validation`, `before_save` or `before_create` fire
    /// before a new record has an id, so their audits are stored with no
    /// `auditable_id` and are not returned by [`audits`](Self::audits) once
    /// the record is created.
    pub fn audit(&self, options: AuditOptions<M>) -> Result<AuditKey> {
        let (when, condition, message) = options.into_parts()?;
        Ok(self.register(when, condition, message))
    }

    /// Register the configured rules whose `model` is this type.
    ///
    /// Every matching rule is checked before any is registered; one invalid
    /// rule leaves the type as it was. Returns how many were registered.
    pub fn apply_rules(&self, config: &AuditConfig) -> Result<usize> {
        let parts = config
            .rules_for(M::model_name())
            .map(|rule| AuditOptions::<M>::from_symbols(rule.options())?.into_parts())
            .collect::<Result<Vec<_>>>()?;

        let count = parts.len();
        for (when, condition, message) in parts {
            self.register(when, condition, message);
        }
        Ok(count)
    }

    fn register(
        &self,
        when: LifecycleEvent,
        condition: Condition<M>,
        message: MessageSource<M>,
    ) -> AuditKey {
        let audits = self.install_auditing();
        let registration = self.registry.register(when, condition, message);
        self.callbacks.register(
            when,
            Arc::new(AuditListener::new(
                registration.key.clone(),
                Arc::clone(&self.registry),
                audits,
            )),
        );

        debug!(
            model = M::model_name(),
            event = %when,
            key = %registration.key,
            rules = self.registry.len(),
            "Audit rule registered"
        );
        registration.key.clone()
    }

    /// True once any audit rule has been registered
    pub fn is_auditable(&self) -> bool {
        self.audits.get().is_some()
    }

    pub fn registry(&self) -> &AuditRegistry<M> {
        &self.registry
    }

    /// True iff any registered rule's condition holds, whatever its event
    pub fn will_be_audited(&self, model: &M) -> Result<bool> {
        auditing::any_rule_applies(&self.registry, model)
    }

    /// True iff a rule bound to an event still to fire during a save of
    /// kind `persistence` has a condition that holds
    pub fn will_be_audited_on(&self, model: &M, persistence: Persistence) -> Result<bool> {
        auditing::upcoming_rule_applies(&self.registry, model, persistence)
    }

    /// Audits recorded for `model`, in association order (newest first by default)
    pub async fn audits(&self, model: &M) -> Result<Vec<Audit>> {
        match self.audits.get() {
            Some(audits) => audits.load(&AuditableRef::of(model)).await,
            None => Ok(Vec::new()),
        }
    }

    fn install_auditing(&self) -> Arc<AuditsAssociation> {
        let audits = self.audits.get_or_init(|| {
            let spec = AssociationSpec::audits(&self.settings.association);
            self.associations.write().push(spec.clone());
            self.validators.register_if(
                Arc::new(AuditorPresence::new(self.settings.auditor_message.clone())),
                auditing::will_be_audited_condition(
                    Arc::clone(&self.registry),
                    self.settings.policy,
                ),
            );
            info!(
                model = M::model_name(),
                association = %spec.name,
                order = %spec.order(),
                policy = ?self.settings.policy,
                "Model is now auditable"
            );
            Arc::new(AuditsAssociation::new(spec, Arc::clone(&self.store)))
        });
        Arc::clone(audits)
    }
}

fn persistence_of<M: Model>(model: &M) -> Persistence {
    if model.is_new_record() {
        Persistence::Create
    } else {
        Persistence::Update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditStore;
    use crate::callbacks::FnListener;
    use crate::dispatch::Condition;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Ticket {
        id: Option<String>,
        closed: bool,
        auditor: Option<String>,
    }

    impl Model for Ticket {
        fn model_name() -> &'static str {
            "Ticket"
        }

        fn id(&self) -> Option<String> {
            self.id.clone()
        }

        fn assign_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    impl Auditable for Ticket {
        fn auditor(&self) -> Option<&str> {
            self.auditor.as_deref()
        }

        fn set_auditor(&mut self, auditor: Option<String>) {
            self.auditor = auditor;
        }
    }

    fn tickets() -> (ModelDefinition<Ticket>, Arc<MemoryAuditStore>) {
        let store = Arc::new(MemoryAuditStore::new());
        (ModelDefinition::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_save_fires_events_in_order() {
        let (definition, _store) = tickets();
        let fired = Arc::new(Mutex::new(Vec::new()));
        for event in LifecycleEvent::ALL {
            let fired = Arc::clone(&fired);
            definition.on(
                event,
                Arc::new(FnListener(move |_: &Ticket| -> Result<()> {
                    fired.lock().push(event);
                    Ok(())
                })),
            );
        }

        let mut ticket = Ticket::default();
        definition.save(&mut ticket).await.unwrap();
        definition.save(&mut ticket).await.unwrap();
        definition.destroy(&ticket).await.unwrap();

        use LifecycleEvent::*;
        assert_eq!(
            *fired.lock(),
            vec![
                BeforeValidation,
                AfterValidation,
                BeforeSave,
                BeforeCreate,
                AfterCreate,
                AfterSave,
                BeforeValidation,
                AfterValidation,
                BeforeSave,
                BeforeUpdate,
                AfterUpdate,
                AfterSave,
                BeforeDestroy,
                AfterDestroy,
            ]
        );
        assert!(ticket.id.is_some());
    }

    #[tokio::test]
    async fn test_destroy_rule_records_audit() {
        let (definition, store) = tickets();
        definition
            .audit(
                AuditOptions::new(LifecycleEvent::BeforeDestroy)
                    .condition(Condition::direct(|t: &Ticket| t.closed))
                    .with_message_fn(|_| "Closed ticket removed".to_string()),
            )
            .unwrap();

        let ticket = Ticket {
            id: Some("t-1".to_string()),
            closed: true,
            auditor: Some("ops".to_string()),
        };
        definition.destroy(&ticket).await.unwrap();

        let audits = store.all();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].auditable_type, "Ticket");
        assert_eq!(audits[0].auditor.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn test_unaudited_type_has_no_audits() {
        let (definition, _store) = tickets();
        let ticket = Ticket::default();

        assert!(!definition.is_auditable());
        assert!(definition.audits(&ticket).await.unwrap().is_empty());
        assert!(!definition.will_be_audited(&ticket).unwrap());
    }

    #[test]
    fn test_validator_installed_once() {
        let (definition, _store) = tickets();
        for _ in 0..3 {
            definition
                .audit(
                    AuditOptions::new(LifecycleEvent::AfterSave)
                        .if_fn(|_| true)
                        .with_message_fn(|_| "saved".to_string()),
                )
                .unwrap();
        }

        assert_eq!(definition.validators.len(), 1);
        assert_eq!(definition.registry().len(), 3);
        assert_eq!(definition.validate(&Ticket::default()).unwrap().len(), 1);
    }
}
