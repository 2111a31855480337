//! Condition and message producers
//!
//! Both come in two forms: a function applied to the instance, or the name
//! of a method looked up on the instance through [`Model::invoke`] when the
//! rule is evaluated.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{AuditError, Result};
use crate::model::Model;

pub type PredicateFn<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;
pub type MessageFn<M> = Arc<dyn Fn(&M) -> String + Send + Sync>;

/// Decides whether a rule applies to an instance
pub enum Condition<M> {
    Direct(PredicateFn<M>),
    Named(String),
}

impl<M: Model> Condition<M> {
    pub fn direct<F>(predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self::Direct(Arc::new(predicate))
    }

    pub fn named(method: impl Into<String>) -> Self {
        Self::Named(method.into())
    }

    pub fn evaluate(&self, model: &M) -> Result<bool> {
        match self {
            Self::Direct(predicate) => Ok(predicate(model)),
            Self::Named(method) => invoke(model, method).map(|value| is_truthy(&value)),
        }
    }
}

/// Produces the audit message for an instance
pub enum MessageSource<M> {
    Direct(MessageFn<M>),
    Named(String),
}

impl<M: Model> MessageSource<M> {
    pub fn direct<F>(producer: F) -> Self
    where
        F: Fn(&M) -> String + Send + Sync + 'static,
    {
        Self::Direct(Arc::new(producer))
    }

    pub fn named(method: impl Into<String>) -> Self {
        Self::Named(method.into())
    }

    pub fn produce(&self, model: &M) -> Result<String> {
        match self {
            Self::Direct(producer) => Ok(producer(model)),
            Self::Named(method) => match invoke(model, method)? {
                Value::String(message) => Ok(message),
                Value::Null => Err(AuditError::InvalidMessage {
                    model: M::model_name().to_string(),
                    source_name: method.clone(),
                    message: "returned null".to_string(),
                }),
                other => Ok(other.to_string()),
            },
        }
    }
}

fn invoke<M: Model>(model: &M, method: &str) -> Result<Value> {
    model
        .invoke(method)
        .ok_or_else(|| AuditError::undefined_method(M::model_name(), method))
}

/// `null` and `false` are falsy, everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

// Manual impls: derives would require `M: Clone` / `M: Debug`.

impl<M> Clone for Condition<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(predicate) => Self::Direct(Arc::clone(predicate)),
            Self::Named(method) => Self::Named(method.clone()),
        }
    }
}

impl<M> Clone for MessageSource<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(producer) => Self::Direct(Arc::clone(producer)),
            Self::Named(method) => Self::Named(method.clone()),
        }
    }
}

impl<M> fmt::Debug for Condition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Condition::Direct(..)"),
            Self::Named(method) => write!(f, "Condition::Named({method:?})"),
        }
    }
}

impl<M> fmt::Debug for MessageSource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("MessageSource::Direct(..)"),
            Self::Named(method) => write!(f, "MessageSource::Named({method:?})"),
        }
    }
}
