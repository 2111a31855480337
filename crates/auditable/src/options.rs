//! Audit Options
//!
//! The arguments of one `audit` call. Built either with the typed builder or
//! from symbolic key/value pairs, which only recognise `when`, `if` and
//! `with_message`.

use std::fmt;

use crate::dispatch::{Condition, MessageSource};
use crate::error::{AuditError, Result};
use crate::lifecycle::LifecycleEvent;
use crate::model::Model;

pub const RECOGNIZED_KEYS: &[&str] = &["when", "if", "with_message"];

pub struct AuditOptions<M> {
    pub(crate) when: LifecycleEvent,
    pub(crate) condition: Option<Condition<M>>,
    pub(crate) message: Option<MessageSource<M>>,
}

impl<M> fmt::Debug for AuditOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditOptions")
            .field("when", &self.when)
            .field("condition", &self.condition)
            .field("message", &self.message)
            .finish()
    }
}

impl<M: Model> AuditOptions<M> {
    pub fn new(when: LifecycleEvent) -> Self {
        Self {
            when,
            condition: None,
            message: None,
        }
    }

    pub fn condition(mut self, condition: Condition<M>) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn message(mut self, message: MessageSource<M>) -> Self {
        self.message = Some(message);
        self
    }

    /// Shorthand for `condition(Condition::direct(..))`
    pub fn if_fn<F>(self, predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.condition(Condition::direct(predicate))
    }

    /// Shorthand for `message(MessageSource::direct(..))`
    pub fn with_message_fn<F>(self, producer: F) -> Self
    where
        F: Fn(&M) -> String + Send + Sync + 'static,
    {
        self.message(MessageSource::direct(producer))
    }

    /// Build options from symbolic pairs such as
    /// `[("when", "before_update"), ("if", "published?"), ("with_message", "publish_message")]`.
    ///
    /// `if` and `with_message` become named-method lookups. A key outside
    /// [`RECOGNIZED_KEYS`] is an `InvalidConfiguration` error.
    pub fn from_symbols<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut when = None;
        let mut condition = None;
        let mut message = None;

        for (key, value) in pairs {
            let key = key.as_ref().trim_start_matches(':');
            let value = value.as_ref().trim_start_matches(':');
            match key {
                "when" => when = Some(value.parse::<LifecycleEvent>()?),
                "if" => condition = Some(Condition::named(value)),
                "with_message" => message = Some(MessageSource::named(value)),
                unknown => {
                    return Err(AuditError::invalid_configuration(format!(
                        "unknown key `{unknown}`, valid keys are {}",
                        RECOGNIZED_KEYS.join(", ")
                    )))
                }
            }
        }

        let when =
            when.ok_or_else(|| AuditError::invalid_configuration("missing required key `when`"))?;
        Ok(Self {
            when,
            condition,
            message,
        })
    }

    pub fn when(&self) -> LifecycleEvent {
        self.when
    }

    /// Checks the options are complete and splits them into their parts
    pub(crate) fn into_parts(self) -> Result<(LifecycleEvent, Condition<M>, MessageSource<M>)> {
        let when = self.when;
        let missing = |key: &str| {
            AuditError::invalid_configuration(format!("audit on `{when}` is missing `{key}`"))
        };
        let condition = self.condition.ok_or_else(|| missing("if"))?;
        let message = self.message.ok_or_else(|| missing("with_message"))?;
        Ok((when, condition, message))
    }
}
