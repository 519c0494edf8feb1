//! Soft deletes.
//!
//! Deleting only sets the delete marker. The record stays in the index (and
//! in the journal) so a synchronization peer can still read the tombstone and
//! its version token through [`FileIndex::get_record`]. Every listing skips
//! tombstones as soon as the marker is published; there is no cache to expire.

use super::file_index::{FileIndex, normalize_name};
use crate::{
    errors::{IndexError, IndexResult},
    models::record::FileRecord,
};
use chrono::Utc;
use tracing::info;

impl FileIndex {
    /// Mark the live record under `name` as deleted.
    ///
    /// Returns the tombstoned record. Deleting an unknown or already deleted
    /// name fails with `NotFound`.
    pub async fn delete(&self, name: &str) -> IndexResult<FileRecord> {
        let name = normalize_name(name)?;
        let _guard = self.locks.lock(&name).await;

        let Some(mut record) = self.live_record(&name) else {
            return Err(IndexError::NotFound(name));
        };
        record.metadata.delete_marker = true;
        record.metadata.last_modified = Some(Utc::now());
        record.metadata.etag = Some(self.etags.next());

        self.store(&record).await?;
        info!(name = %name, "marked file as deleted");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        errors::IndexError,
        models::query::ListFilesParams,
        services::{
            file_index::{FileIndex, IndexOptions},
            test_support::upload,
        },
    };

    #[tokio::test]
    async fn tombstone_hides_from_listings_but_not_from_get() {
        let index = FileIndex::new(IndexOptions::default());
        let live = upload(&index, "docs/a.txt", 3).await;

        let tombstone = index.delete("/docs/a.txt").await.unwrap();
        assert!(tombstone.is_deleted());
        assert!(tombstone.etag() > live.etag());
        assert_eq!(tombstone.uploaded_size, live.uploaded_size);

        assert!(index.list_folders("", 0, 1024).unwrap().is_empty());
        assert!(
            index
                .list_files(&ListFilesParams::new("docs"))
                .unwrap()
                .files
                .is_empty()
        );
        assert_eq!(index.get_record("docs/a.txt").unwrap(), tombstone);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let index = FileIndex::new(IndexOptions::default());
        upload(&index, "a.txt", 0).await;
        index.delete("a.txt").await.unwrap();
        assert!(matches!(
            index.delete("a.txt").await,
            Err(IndexError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_unknown_is_not_found() {
        let index = FileIndex::new(IndexOptions::default());
        assert!(matches!(
            index.delete("missing.txt").await,
            Err(IndexError::NotFound(name)) if name == "/missing.txt"
        ));
    }

    #[tokio::test]
    async fn folder_survives_while_other_members_live() {
        let index = FileIndex::new(IndexOptions::default());
        upload(&index, "docs/a.txt", 0).await;
        upload(&index, "docs/b.txt", 0).await;
        index.delete("docs/a.txt").await.unwrap();
        assert_eq!(index.list_folders("", 0, 1024).unwrap(), ["/docs"]);
    }
}
