//! Audit Stores

use async_trait::async_trait;
use auditable_config::{OrderColumn, SortDirection, StoreConfig};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;

use super::entity::{Audit, NewAudit};
use crate::error::{AuditError, Result};
use crate::model::AuditableRef;

/// Load order of an owner's audits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditOrder {
    pub column: OrderColumn,
    pub direction: SortDirection,
}

impl AuditOrder {
    pub fn new(column: OrderColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Compare two entries on the ordering column, ascending
    fn compare(&self, a: &Audit, b: &Audit) -> Ordering {
        match self.column {
            OrderColumn::Id => a.id.cmp(&b.id),
            OrderColumn::Message => a.message.cmp(&b.message),
            OrderColumn::Auditor => a.auditor.cmp(&b.auditor),
            OrderColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

/// Persistence port for audit entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a new entry and return it with its id and timestamp
    async fn create(&self, audit: NewAudit) -> Result<Audit>;

    /// Entries owned by `owner` sorted by `order`. Entries that tie on the
    /// ordering column keep their insertion order (reversed for `Desc`).
    /// A missing auditor sorts before any auditor.
    async fn find_for(&self, owner: &AuditableRef, order: AuditOrder) -> Result<Vec<Audit>>;
}

/// Process-local store, used by default and in tests
#[derive(Default)]
pub struct MemoryAuditStore {
    audits: Mutex<Vec<Audit>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry in insertion order
    pub fn all(&self) -> Vec<Audit> {
        self.audits.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.audits.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.audits.lock().is_empty()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn create(&self, audit: NewAudit) -> Result<Audit> {
        let audit = audit.into_audit();
        self.audits.lock().push(audit.clone());
        Ok(audit)
    }

    async fn find_for(&self, owner: &AuditableRef, order: AuditOrder) -> Result<Vec<Audit>> {
        let mut found: Vec<Audit> = self
            .audits
            .lock()
            .iter()
            .filter(|audit| audit.belongs_to(owner))
            .cloned()
            .collect();

        // Stable sorts: ties stay in insertion order
        match order.direction {
            SortDirection::Asc => found.sort_by(|a, b| order.compare(a, b)),
            SortDirection::Desc => {
                found.reverse();
                found.sort_by(|a, b| order.compare(b, a));
            }
        }
        Ok(found)
    }
}

/// Build the store named by `config.kind`
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn AuditStore>> {
    match config.kind.as_str() {
        "memory" => {
            info!("Using in-memory audit store");
            Ok(Arc::new(MemoryAuditStore::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let store = super::sqlite::SqliteAuditStore::connect(config).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(AuditError::store(
            "sqlite audit store requires the `sqlite` feature",
        )),
        other => Err(AuditError::store(format!("unknown audit store kind `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> AuditableRef {
        AuditableRef::new("Article", Some(id.to_string()))
    }

    #[tokio::test]
    async fn test_find_for_scopes_by_owner() {
        let store = MemoryAuditStore::new();
        store.create(NewAudit::new(article("1"), "one", None)).await.unwrap();
        store.create(NewAudit::new(article("2"), "two", None)).await.unwrap();
        store
            .create(NewAudit::new(
                AuditableRef::new("Comment", Some("1".to_string())),
                "comment",
                None,
            ))
            .await
            .unwrap();

        let found = store.find_for(&article("1"), AuditOrder::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "one");
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let store = MemoryAuditStore::new();
        for message in ["first", "second", "third"] {
            store.create(NewAudit::new(article("1"), message, None)).await.unwrap();
        }

        let desc: Vec<String> = store
            .find_for(&article("1"), AuditOrder::default())
            .await
            .unwrap()
            .into_iter()
            .map(|audit| audit.message)
            .collect();
        assert_eq!(desc, vec!["third", "second", "first"]);

        let asc: Vec<String> = store
            .find_for(&article("1"), AuditOrder::new(OrderColumn::CreatedAt, SortDirection::Asc))
            .await
            .unwrap()
            .into_iter()
            .map(|audit| audit.message)
            .collect();
        assert_eq!(asc, vec!["first", "second", "third"]);
    }

    async fn messages(store: &MemoryAuditStore, order: AuditOrder) -> Vec<String> {
        store
            .find_for(&article("1"), order)
            .await
            .unwrap()
            .into_iter()
            .map(|audit| audit.message)
            .collect()
    }

    #[tokio::test]
    async fn test_sorts_by_configured_column() {
        let store = MemoryAuditStore::new();
        store.create(NewAudit::new(article("1"), "zzz", Some("bob".to_string()))).await.unwrap();
        store.create(NewAudit::new(article("1"), "aaa", None)).await.unwrap();
        store.create(NewAudit::new(article("1"), "mmm", Some("amy".to_string()))).await.unwrap();

        let by_message = AuditOrder::new(OrderColumn::Message, SortDirection::Asc);
        assert_eq!(messages(&store, by_message).await, vec!["aaa", "mmm", "zzz"]);

        let by_message_desc = AuditOrder::new(OrderColumn::Message, SortDirection::Desc);
        assert_eq!(messages(&store, by_message_desc).await, vec!["zzz", "mmm", "aaa"]);

        let by_auditor = AuditOrder::new(OrderColumn::Auditor, SortDirection::Asc);
        assert_eq!(messages(&store, by_auditor).await, vec!["aaa", "mmm", "zzz"]);
    }

    #[tokio::test]
    async fn test_ties_on_column_keep_insertion_order() {
        let store = MemoryAuditStore::new();
        for message in ["first", "second"] {
            store
                .create(NewAudit::new(article("1"), message, Some("bob".to_string())))
                .await
                .unwrap();
        }

        let asc = AuditOrder::new(OrderColumn::Auditor, SortDirection::Asc);
        assert_eq!(messages(&store, asc).await, vec!["first", "second"]);

        let desc = AuditOrder::new(OrderColumn::Auditor, SortDirection::Desc);
        assert_eq!(messages(&store, desc).await, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let store = connect(&StoreConfig::default()).await.unwrap();
        let audit = store.create(NewAudit::new(article("9"), "hello", None)).await.unwrap();
        assert_eq!(audit.auditable_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_connect_unknown_kind() {
        let config = StoreConfig {
            kind: "redis".to_string(),
            ..StoreConfig::default()
        };
        assert!(matches!(connect(&config).await, Err(AuditError::Store { .. })));
    }
}
