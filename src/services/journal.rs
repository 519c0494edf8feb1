//! RecordJournal: durable copy of the record map, kept in SQLite.
//!
//! The in-memory index is authoritative for reads. Every write goes through
//! the journal first, so a reopened index starts from exactly what the last
//! run published. Sizes are stored with bit-preserving `u64`/`i64` casts.

use crate::{
    errors::IndexResult,
    models::{metadata::Metadata, record::FileRecord},
};
use sqlx::{Executor, FromRow, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

const MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct RecordJournal {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

#[derive(FromRow)]
struct RecordRow {
    name: String,
    total_size: Option<i64>,
    uploaded_size: i64,
    metadata: String,
}

impl RecordRow {
    fn into_record(self) -> IndexResult<FileRecord> {
        let metadata: Metadata = serde_json::from_str(&self.metadata)?;
        Ok(FileRecord {
            name: self.name,
            metadata,
            total_size: self.total_size.map(|size| size as u64),
            uploaded_size: self.uploaded_size as u64,
        })
    }
}

impl RecordJournal {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create the schema if it does not exist yet. Safe to run repeatedly.
    pub async fn migrate(&self) -> IndexResult<()> {
        let statements = MIGRATION
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Count one more opening of this index and return the new count.
    pub async fn next_restart(&self) -> IndexResult<u64> {
        let restarts = sqlx::query_scalar::<_, i64>(
            "INSERT INTO index_state (key, value) VALUES ('restarts', 1)
             ON CONFLICT(key) DO UPDATE SET value = value + 1
             RETURNING value",
        )
        .fetch_one(&*self.db)
        .await?;
        Ok(restarts as u64)
    }

    pub async fn load_all(&self) -> IndexResult<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT name, total_size, uploaded_size, metadata
             FROM file_records ORDER BY name ASC",
        )
        .fetch_all(&*self.db)
        .await?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// Insert or overwrite one record.
    pub async fn upsert(&self, record: &FileRecord) -> IndexResult<()> {
        write_record(&*self.db, record).await
    }

    /// Move `old_name` to `moved.name` in one transaction. Any row already
    /// stored under the new name (a tombstone) is replaced.
    pub async fn rename(&self, old_name: &str, moved: &FileRecord) -> IndexResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM file_records WHERE name = ? OR name = ?")
            .bind(old_name.to_string())
            .bind(moved.name.clone())
            .execute(&mut *tx)
            .await?;
        write_record(&mut *tx, moved).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn write_record<'e, E>(executor: E, record: &FileRecord) -> IndexResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let metadata = serde_json::to_string(&record.metadata)?;
    sqlx::query(
        r#"
        INSERT INTO file_records (name, total_size, uploaded_size, metadata, is_deleted)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            total_size = excluded.total_size,
            uploaded_size = excluded.uploaded_size,
            metadata = excluded.metadata,
            is_deleted = excluded.is_deleted
        "#,
    )
    .bind(record.name.clone())
    .bind(record.total_size.map(|size| size as i64))
    .bind(record.uploaded_size as i64)
    .bind(metadata)
    .bind(record.is_deleted())
    .execute(executor)
    .await?;
    Ok(())
}
