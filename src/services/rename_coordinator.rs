//! Renames: moving a record from one name to another in a single step.
//!
//! Folders need no bookkeeping here. A folder that loses its last live
//! record simply stops showing up in listings, and the destination folder
//! appears as soon as the moved record is published.

use super::file_index::{FileIndex, normalize_name};
use crate::{
    errors::{IndexError, IndexResult},
    models::record::FileRecord,
};
use tracing::info;

impl FileIndex {
    /// Move the live record at `old_name` to `new_name`.
    ///
    /// Fails with `NotFound` when `old_name` has no live record and with
    /// `Conflict` when `new_name` already holds one. A tombstone under
    /// `new_name` is replaced. Readers see either the old name or the new
    /// one, never both and never neither. Everything but the name, version
    /// token included, carries over unchanged.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> IndexResult<FileRecord> {
        let old_name = normalize_name(old_name)?;
        let new_name = normalize_name(new_name)?;
        if old_name == new_name {
            return match self.live_record(&old_name) {
                Some(_) => Err(IndexError::Conflict(new_name)),
                None => Err(IndexError::NotFound(old_name)),
            };
        }

        let (_old_guard, _new_guard) = self.locks.lock_pair(&old_name, &new_name).await;

        let Some(record) = self.live_record(&old_name) else {
            return Err(IndexError::NotFound(old_name));
        };
        if self.live_record(&new_name).is_some() {
            return Err(IndexError::Conflict(new_name));
        }

        let moved = FileRecord {
            name: new_name.clone(),
            ..record
        };

        if let Some(journal) = &self.journal {
            journal.rename(&old_name, &moved).await?;
        }
        {
            let mut records = self.records.write();
            records.remove(&old_name);
            records.insert(new_name.clone(), moved.clone());
        }

        info!(from = %old_name, to = %new_name, "renamed file");
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        errors::IndexError,
        models::{metadata::Metadata, query::ListFilesParams},
        services::{
            file_index::{FileIndex, IndexOptions},
            test_support::upload,
        },
    };
    use serde_json::json;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    fn index() -> FileIndex {
        FileIndex::new(IndexOptions::default())
    }

    #[tokio::test]
    async fn moves_record_and_keeps_fields() {
        let index = index();
        let mut delta = Metadata::with_size(3);
        delta.custom.insert("Owner".into(), json!("ops"));
        index.begin_or_continue_upload("test/abc.txt", delta, 3).await.unwrap();
        let original = index
            .begin_or_continue_upload("test/abc.txt", Metadata::with_content_md5("ff"), 0)
            .await
            .unwrap();

        let moved = index.rename("test/abc.txt", "test2/abc.txt").await.unwrap();

        assert!(matches!(
            index.get_record("test/abc.txt"),
            Err(IndexError::NotFound(_))
        ));
        let fetched = index.get_record("test2/abc.txt").unwrap();
        assert_eq!(fetched, moved);
        assert_eq!(fetched.total_size, original.total_size);
        assert_eq!(fetched.uploaded_size, original.uploaded_size);
        assert_eq!(fetched.metadata, original.metadata);
    }

    #[tokio::test]
    async fn folders_follow_the_rename() {
        let index = index();
        upload(&index, "test/abc.txt", 0).await;
        assert!(index.list_folders("", 0, 1024).unwrap().contains(&"/test".to_string()));

        index.rename("test/abc.txt", "test2/abc.txt").await.unwrap();

        let folders = index.list_folders("", 0, 1024).unwrap();
        assert!(!folders.contains(&"/test".to_string()));
        assert!(folders.contains(&"/test2".to_string()));
        assert_eq!(
            index.list_files(&ListFilesParams::new("test2")).unwrap().total,
            1
        );
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let index = index();
        assert!(matches!(
            index.rename("nope", "other").await,
            Err(IndexError::NotFound(_))
        ));

        upload(&index, "gone", 0).await;
        index.delete("gone").await.unwrap();
        assert!(matches!(
            index.rename("gone", "other").await,
            Err(IndexError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn live_target_conflicts() {
        let index = index();
        upload(&index, "a", 1).await;
        upload(&index, "b", 2).await;
        assert!(matches!(
            index.rename("a", "b").await,
            Err(IndexError::Conflict(name)) if name == "/b"
        ));
        assert!(matches!(
            index.rename("a", "/a").await,
            Err(IndexError::Conflict(_))
        ));
        assert_eq!(index.get_record("a").unwrap().total_size, Some(1));
        assert_eq!(index.get_record("b").unwrap().total_size, Some(2));
    }

    #[tokio::test]
    async fn tombstoned_target_is_replaced() {
        let index = index();
        upload(&index, "a", 1).await;
        upload(&index, "b", 2).await;
        index.delete("b").await.unwrap();

        let moved = index.rename("a", "b").await.unwrap();
        assert!(!moved.is_deleted());
        assert_eq!(index.get_record("b").unwrap().total_size, Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_a_half_done_rename() {
        let index = index();
        upload(&index, "x/f.txt", 1).await;
        let done = Arc::new(AtomicBool::new(false));

        let mut readers = Vec::new();
        for _ in 0..3 {
            let index = index.clone();
            let done = done.clone();
            readers.push(tokio::spawn(async move {
                let mut checks = 0u64;
                loop {
                    // one read lock, so both names come from the same snapshot
                    {
                        let records = index.records.read();
                        assert!(
                            records.contains_key("/x/f.txt") ^ records.contains_key("/y/f.txt")
                        );
                    }
                    let folders = index.list_folders("/", 0, 1024).unwrap();
                    assert!(folders == ["/x"] || folders == ["/y"], "{folders:?}");
                    let x = index.list_files(&ListFilesParams::new("/x")).unwrap().total;
                    let y = index.list_files(&ListFilesParams::new("/y")).unwrap().total;
                    assert!(x <= 1 && y <= 1);
                    checks += 1;
                    if done.load(Ordering::Acquire) {
                        break checks;
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        for _ in 0..200 {
            index.rename("x/f.txt", "y/f.txt").await.unwrap();
            index.rename("y/f.txt", "x/f.txt").await.unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.await.unwrap() > 0);
        }
        assert_eq!(index.get_record("x/f.txt").unwrap().total_size, Some(1));
        assert_eq!(index.locks.slot_count(), 0);
    }

    #[tokio::test]
    async fn rejects_invalid_target_name() {
        let index = index();
        upload(&index, "a", 1).await;
        assert!(matches!(
            index.rename("a", "dir/").await,
            Err(IndexError::InvalidName { .. })
        ));
    }
}
