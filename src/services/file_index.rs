//! src/services/file_index.rs
//!
//! FileIndex: the live mapping from name to [`FileRecord`], shared by every
//! read and write path. Reads take one read lock per call and therefore see
//! one consistent snapshot. Writes are serialized per name, go through the
//! optional SQLite journal, and are then published under a short write lock.
//!
//! The read views (folders, file queries) and the writers (uploads, renames,
//! deletes) live in sibling modules as further `impl FileIndex` blocks.

use super::{journal::RecordJournal, name_locks::NameLocks};
use crate::{
    errors::{IndexError, IndexResult},
    models::{etag::EtagGenerator, record::FileRecord},
};
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::{collections::BTreeMap, sync::Arc};
use tracing::info;

const MAX_NAME_LEN: usize = 1024;

/// Behaviour switches of an index.
#[derive(Clone, Copy, Debug)]
pub struct IndexOptions {
    /// Whether search patterns compare letters case-sensitively.
    pub case_sensitive_search: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            case_sensitive_search: true,
        }
    }
}

#[derive(Clone)]
pub struct FileIndex {
    /// Every record, tombstones included, ordered by name.
    pub(crate) records: Arc<RwLock<BTreeMap<String, FileRecord>>>,

    pub(crate) locks: Arc<NameLocks>,

    pub(crate) etags: Arc<EtagGenerator>,

    /// Durable copy; `None` for a purely in-memory index.
    pub(crate) journal: Option<RecordJournal>,

    pub(crate) options: IndexOptions,
}

impl FileIndex {
    /// Create an empty index that lives only in memory.
    pub fn new(options: IndexOptions) -> Self {
        Self::with_parts(options, 0, None, Vec::new())
    }

    /// Open an index backed by the SQLite pool. The schema must already
    /// exist (see [`RecordJournal::migrate`]).
    pub async fn open(db: Arc<SqlitePool>, options: IndexOptions) -> IndexResult<Self> {
        let journal = RecordJournal::new(db);
        let restarts = journal.next_restart().await?;
        let records = journal.load_all().await?;
        info!(records = records.len(), restarts, "opened file index");
        Ok(Self::with_parts(options, restarts, Some(journal), records))
    }

    fn with_parts(
        options: IndexOptions,
        restarts: u64,
        journal: Option<RecordJournal>,
        records: Vec<FileRecord>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
            locks: Arc::new(NameLocks::default()),
            etags: Arc::new(EtagGenerator::new(restarts)),
            journal,
            options,
        }
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Fetch a record by exact name. Tombstoned records are returned too.
    pub fn get_record(&self, name: &str) -> IndexResult<FileRecord> {
        let name = normalize_name(name)?;
        self.records
            .read()
            .get(&name)
            .cloned()
            .ok_or(IndexError::NotFound(name))
    }

    /// Names of live records whose upload never finished, for an external
    /// scanner that decides when to give up on them.
    pub fn incomplete_uploads(&self) -> Vec<String> {
        self.records
            .read()
            .values()
            .filter(|record| !record.is_deleted() && record.is_upload_incomplete())
            .map(|record| record.name.clone())
            .collect()
    }

    /// Live (non-tombstoned) record under `name`, if any.
    pub(crate) fn live_record(&self, name: &str) -> Option<FileRecord> {
        self.records
            .read()
            .get(name)
            .filter(|record| !record.is_deleted())
            .cloned()
    }

    /// Persist a record and publish it to readers. Callers hold the name lock.
    pub(crate) async fn store(&self, record: &FileRecord) -> IndexResult<()> {
        if let Some(journal) = &self.journal {
            journal.upsert(record).await?;
        }
        self.records
            .write()
            .insert(record.name.clone(), record.clone());
        Ok(())
    }
}

/// Bring a file name into absolute form (`test/a.txt` becomes `/test/a.txt`)
/// and reject names that cannot be a file path.
pub fn normalize_name(name: &str) -> IndexResult<String> {
    if name.is_empty() {
        return Err(IndexError::invalid_name(name, "cannot be empty"));
    }
    let absolute = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    };
    if absolute.len() > MAX_NAME_LEN {
        return Err(IndexError::invalid_name(
            name,
            format!("longer than {MAX_NAME_LEN} bytes"),
        ));
    }
    if absolute.ends_with('/') {
        return Err(IndexError::invalid_name(name, "cannot end with '/'"));
    }
    if absolute.chars().any(|c| c.is_control() || c == '\\') {
        return Err(IndexError::invalid_name(
            name,
            "control characters and backslashes are not allowed",
        ));
    }
    for segment in absolute[1..].split('/') {
        match segment {
            "" => return Err(IndexError::invalid_name(name, "empty path segment")),
            "." | ".." => {
                return Err(IndexError::invalid_name(
                    name,
                    "'.' and '..' segments are not allowed",
                ));
            }
            _ => {}
        }
    }
    Ok(absolute)
}

/// Normalize a folder argument: trailing slashes are dropped and root is the
/// empty string, so `test`, `/test` and `/test/` all become `/test`.
pub fn normalize_folder(folder: &str) -> IndexResult<String> {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    normalize_name(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::upload;

    #[test]
    fn names_become_absolute() {
        assert_eq!(normalize_name("test/abc.txt").unwrap(), "/test/abc.txt");
        assert_eq!(normalize_name("/abc.txt").unwrap(), "/abc.txt");
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["", "/", "a/", "a//b", "a/../b", "./a", "a\\b", "a\0b"] {
            assert!(
                matches!(normalize_name(bad), Err(IndexError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(normalize_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn folders_ignore_trailing_slash() {
        assert_eq!(normalize_folder("test").unwrap(), "/test");
        assert_eq!(normalize_folder("test/").unwrap(), "/test");
        assert_eq!(normalize_folder("/test//").unwrap(), "/test");
        assert_eq!(normalize_folder("/").unwrap(), "");
        assert_eq!(normalize_folder("").unwrap(), "");
    }

    #[test]
    fn unknown_record_is_not_found() {
        let index = FileIndex::new(IndexOptions::default());
        assert!(matches!(
            index.get_record("nope.txt"),
            Err(IndexError::NotFound(name)) if name == "/nope.txt"
        ));
    }

    #[tokio::test]
    async fn incomplete_uploads_lists_live_unfinished_records() {
        let index = FileIndex::new(IndexOptions::default());
        upload(&index, "done.txt", 4).await;
        index
            .begin_or_continue_upload("partial.txt", crate::models::metadata::Metadata::with_size(10), 3)
            .await
            .unwrap();
        index
            .begin_or_continue_upload("gone.txt", Default::default(), 1)
            .await
            .unwrap();
        index.delete("gone.txt").await.unwrap();

        assert_eq!(index.incomplete_uploads(), vec!["/partial.txt".to_string()]);
    }
}
