//! Validation
//!
//! Field-keyed error collection and the per-type set of conditional
//! validators run before a record is saved.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::lifecycle::Persistence;

/// Errors collected while validating one instance, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Errors {
    entries: IndexMap<String, Vec<String>>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded on `field`
    pub fn on(&self, field: &str) -> &[String] {
        self.entries.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of messages across all fields
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Messages prefixed with their humanized field name, e.g. "Auditor needs to be assigned"
    pub fn full_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(field, messages)| {
                let field = humanize(field);
                messages.iter().map(move |message| format!("{field} {message}"))
            })
            .collect()
    }
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// What the pending save will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub persistence: Persistence,
}

impl ValidationContext {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }
}

/// Adds errors for one rule.
pub trait Validator<M>: Send + Sync {
    fn validate(&self, model: &M, ctx: &ValidationContext, errors: &mut Errors) -> Result<()>;
}

pub type ValidationCondition<M> = Arc<dyn Fn(&M, &ValidationContext) -> Result<bool> + Send + Sync>;

struct ValidationRule<M> {
    validator: Arc<dyn Validator<M>>,
    condition: Option<ValidationCondition<M>>,
}

pub struct ValidatorSet<M> {
    rules: RwLock<Vec<ValidationRule<M>>>,
}

impl<M> ValidatorSet<M> {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, validator: Arc<dyn Validator<M>>) {
        self.rules.write().push(ValidationRule {
            validator,
            condition: None,
        });
    }

    /// Register a validator that only runs when `condition` holds
    pub fn register_if(&self, validator: Arc<dyn Validator<M>>, condition: ValidationCondition<M>) {
        self.rules.write().push(ValidationRule {
            validator,
            condition: Some(condition),
        });
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    pub fn run(&self, model: &M, ctx: &ValidationContext) -> Result<Errors> {
        let mut errors = Errors::new();
        for rule in self.rules.read().iter() {
            if let Some(condition) = &rule.condition {
                if !condition(model, ctx)? {
                    continue;
                }
            }
            rule.validator.validate(model, ctx, &mut errors)?;
        }
        Ok(errors)
    }
}

impl<M> Default for ValidatorSet<M> {
    fn default() -> Self {
        Self::new()
    }
}
