//! Shared test models

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use auditable::{Auditable, MemoryAuditStore, Model, ModelDefinition};
use serde_json::{json, Value};

/// A publishable article with a version counter
#[derive(Debug, Clone, Default)]
pub struct Article {
    pub id: Option<String>,
    pub title: String,
    pub published: bool,
    pub version: u32,
    pub auditor: Option<String>,
}

impl Article {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            version: 1,
            ..Self::default()
        }
    }

    pub fn published(title: &str, version: u32) -> Self {
        Self {
            published: true,
            version,
            ..Self::new(title)
        }
    }

    /// Pretend the article was loaded from storage
    pub fn persisted(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

impl Model for Article {
    fn model_name() -> &'static str {
        "Article"
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn invoke(&self, method: &str) -> Option<Value> {
        match method {
            "published?" => Some(json!(self.published)),
            "draft?" => Some(json!(!self.published)),
            "publish_message" => Some(json!(format!("Published v{}", self.version))),
            "title" => Some(json!(self.title)),
            _ => None,
        }
    }
}

impl Auditable for Article {
    fn auditor(&self) -> Option<&str> {
        self.auditor.as_deref()
    }

    fn set_auditor(&mut self, auditor: Option<String>) {
        self.auditor = auditor;
    }
}

pub fn article_definition() -> (ModelDefinition<Article>, Arc<MemoryAuditStore>) {
    let store = Arc::new(MemoryAuditStore::new());
    (ModelDefinition::new(store.clone()), store)
}

/// Counts how often a message producer ran
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
