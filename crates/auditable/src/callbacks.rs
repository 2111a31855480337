//! Lifecycle Callbacks
//!
//! Per-type table of listeners keyed by lifecycle event.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::Result;
use crate::lifecycle::LifecycleEvent;

/// Runs when a lifecycle event fires for an instance.
///
/// An error aborts the rest of the chain and the operation that fired it.
#[async_trait]
pub trait LifecycleListener<M>: Send + Sync {
    async fn call(&self, model: &M) -> Result<()>;
}

/// Adapts a synchronous closure into a listener
pub struct FnListener<F>(pub F);

#[async_trait]
impl<M, F> LifecycleListener<M> for FnListener<F>
where
    M: Sync,
    F: Fn(&M) -> Result<()> + Send + Sync,
{
    async fn call(&self, model: &M) -> Result<()> {
        (self.0)(model)
    }
}

pub struct CallbackChain<M> {
    listeners: RwLock<HashMap<LifecycleEvent, Vec<Arc<dyn LifecycleListener<M>>>>>,
}

impl<M: Sync> CallbackChain<M> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, event: LifecycleEvent, listener: Arc<dyn LifecycleListener<M>>) {
        self.listeners.write().entry(event).or_default().push(listener);
    }

    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        self.listeners.read().get(&event).map_or(0, Vec::len)
    }

    /// Run the listeners bound to `event` in registration order.
    pub async fn run(&self, event: LifecycleEvent, model: &M) -> Result<()> {
        // Snapshot so no lock is held across an await
        let listeners = self.listeners.read().get(&event).cloned().unwrap_or_default();

        trace!(%event, count = listeners.len(), "Running lifecycle callbacks");
        for listener in listeners {
            listener.call(model).await?;
        }
        Ok(())
    }
}

impl<M: Sync> Default for CallbackChain<M> {
    fn default() -> Self {
        Self::new()
    }
}
