//! SQLite Audit Store
//!
//! Stores audits in a single table keyed by the polymorphic
//! `(auditable_type, auditable_id)` reference. Timestamps are epoch millis.

use async_trait::async_trait;
use auditable_config::{SortDirection, StoreConfig};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::entity::{Audit, NewAudit};
use super::repository::{AuditOrder, AuditStore};
use crate::error::{AuditError, Result};
use crate::model::AuditableRef;

pub struct SqliteAuditStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteAuditStore {
    /// Wrap an existing pool; `table` must be a plain SQL identifier
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AuditError::store(format!("invalid audit table name `{table}`")));
        }
        Ok(Self { pool, table })
    }

    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.database_url)
            .await?;
        info!(table = %config.table, "Connected SQLite audit store");
        Self::new(pool, config.table.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the audits table and its lookup index if missing
    pub async fn migrate(&self) -> Result<()> {
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             id TEXT PRIMARY KEY, \
             message TEXT NOT NULL, \
             auditor TEXT, \
             auditable_type TEXT NOT NULL, \
             auditable_id TEXT, \
             created_at INTEGER NOT NULL)",
            table = self.table
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_auditable \
             ON {table} (auditable_type, auditable_id, created_at)",
            table = self.table
        );
        sqlx::query(&create_index).execute(&self.pool).await?;

        debug!(table = %self.table, "Audit table ready");
        Ok(())
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> Result<Audit> {
        let created_at_ms: i64 = row.try_get("created_at")?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_ms).ok_or_else(|| {
            AuditError::store(format!("invalid created_at timestamp {created_at_ms}"))
        })?;

        Ok(Audit {
            id: row.try_get("id")?,
            message: row.try_get("message")?,
            auditor: row.try_get("auditor")?,
            auditable_type: row.try_get("auditable_type")?,
            auditable_id: row.try_get("auditable_id")?,
            created_at,
        })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn create(&self, audit: NewAudit) -> Result<Audit> {
        let audit = audit.into_audit();
        let query = format!(
            "INSERT INTO {} (id, message, auditor, auditable_type, auditable_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            self.table
        );

        sqlx::query(&query)
            .bind(&audit.id)
            .bind(&audit.message)
            .bind(&audit.auditor)
            .bind(&audit.auditable_type)
            .bind(&audit.auditable_id)
            .bind(audit.created_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(audit)
    }

    async fn find_for(&self, owner: &AuditableRef, order: AuditOrder) -> Result<Vec<Audit>> {
        let column = order.column.as_str();
        let direction = match order.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        // `IS` matches NULL ids for audits recorded before the owner had one
        let query = format!(
            "SELECT id, message, auditor, auditable_type, auditable_id, created_at \
             FROM {} WHERE auditable_type = ? AND auditable_id IS ? \
             ORDER BY {column} {direction}, rowid {direction}",
            self.table
        );

        let rows = sqlx::query(&query)
            .bind(&owner.auditable_type)
            .bind(&owner.auditable_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditable_config::OrderColumn;

    async fn memory_store() -> SqliteAuditStore {
        let store = SqliteAuditStore::connect(&StoreConfig::default()).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = memory_store().await;
        let owner = AuditableRef::new("Article", Some("7".to_string()));

        for message in ["first", "second"] {
            store
                .create(NewAudit::new(owner.clone(), message, Some("alice".to_string())))
                .await
                .unwrap();
        }
        store
            .create(NewAudit::new(
                AuditableRef::new("Article", Some("8".to_string())),
                "other",
                None,
            ))
            .await
            .unwrap();

        let found = store.find_for(&owner, AuditOrder::default()).await.unwrap();
        let messages: Vec<&str> = found.iter().map(|audit| audit.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(found[0].auditor.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_null_owner_id() {
        let store = memory_store().await;
        let owner = AuditableRef::new("Article", None);
        store.create(NewAudit::new(owner.clone(), "draft", None)).await.unwrap();

        let asc = AuditOrder::new(OrderColumn::CreatedAt, SortDirection::Asc);
        let found = store.find_for(&owner, asc).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].auditable_id, None);
    }

    #[tokio::test]
    async fn test_orders_by_configured_column() {
        let store = memory_store().await;
        let owner = AuditableRef::new("Article", Some("3".to_string()));
        for (message, auditor) in [("zzz", Some("bob")), ("aaa", None), ("mmm", Some("amy"))] {
            store
                .create(NewAudit::new(owner.clone(), message, auditor.map(String::from)))
                .await
                .unwrap();
        }

        for (column, expected) in [
            (OrderColumn::Message, ["aaa", "mmm", "zzz"]),
            (OrderColumn::Auditor, ["aaa", "mmm", "zzz"]),
            (OrderColumn::CreatedAt, ["zzz", "aaa", "mmm"]),
        ] {
            let found = store
                .find_for(&owner, AuditOrder::new(column, SortDirection::Asc))
                .await
                .unwrap();
            let messages: Vec<&str> = found.iter().map(|audit| audit.message.as_str()).collect();
            assert_eq!(messages, expected, "ordered by {column}");
        }
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_name() {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        assert!(SqliteAuditStore::new(pool, "audits; DROP TABLE x").is_err());
    }
}
