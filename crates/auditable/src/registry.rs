//! Audit Registry
//!
//! The append-only, ordered list of audit rules owned by one model type.

use chrono::Utc;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{Condition, MessageSource};
use crate::lifecycle::LifecycleEvent;

/// Identifies one registration within its type's registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditKey(String);

impl AuditKey {
    /// Hex SHA-256 of the current timestamp with its characters shuffled
    pub fn generate() -> Self {
        let mut chars: Vec<char> = Utc::now().to_rfc3339().chars().collect();
        chars.shuffle(&mut rand::rng());
        let seed: String = chars.into_iter().collect();
        Self(hex::encode(Sha256::digest(seed.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `audit` call
#[derive(Debug)]
pub struct AuditRegistration<M> {
    pub key: AuditKey,
    pub when: LifecycleEvent,
    pub condition: Condition<M>,
    pub message: MessageSource<M>,
}

pub struct AuditRegistry<M> {
    items: RwLock<Vec<Arc<AuditRegistration<M>>>>,
}

impl<M> AuditRegistry<M> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Append a registration under a key not yet used in this registry
    pub fn register(
        &self,
        when: LifecycleEvent,
        condition: Condition<M>,
        message: MessageSource<M>,
    ) -> Arc<AuditRegistration<M>> {
        let mut items = self.items.write();
        let key = loop {
            let candidate = AuditKey::generate();
            if !items.iter().any(|item| item.key == candidate) {
                break candidate;
            }
        };

        let registration = Arc::new(AuditRegistration {
            key,
            when,
            condition,
            message,
        });
        items.push(Arc::clone(&registration));
        registration
    }

    pub fn find(&self, key: &AuditKey) -> Option<Arc<AuditRegistration<M>>> {
        self.items.read().iter().find(|item| &item.key == key).cloned()
    }

    /// Registrations in the order they were added
    pub fn snapshot(&self) -> Vec<Arc<AuditRegistration<M>>> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<M> Default for AuditRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
