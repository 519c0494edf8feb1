//! Metadata index of a networked file store.
//!
//! Files are addressed by absolute virtual paths (`/photos/2025/img.jpg`).
//! The index derives folders from those names on every query, lists and
//! searches the files of a folder, tracks resumable upload progress, and
//! handles renames and soft deletes. Payload bytes, transport and
//! replication are left to the callers.
//!
//! ```no_run
//! use filestore_index::{FileIndex, IndexOptions, ListFilesParams, Metadata};
//!
//! # async fn demo() -> filestore_index::IndexResult<()> {
//! let index = FileIndex::new(IndexOptions::default());
//! index.begin_or_continue_upload("docs/a.txt", Metadata::with_size(3), 3).await?;
//! index.begin_or_continue_upload("docs/a.txt", Metadata::with_content_md5("..."), 0).await?;
//!
//! assert_eq!(index.list_folders("/", 0, 100)?, ["/docs"]);
//! let listing = index.list_files(&ListFilesParams::new("/docs").pattern("*.txt"))?;
//! assert_eq!(listing.files[0].name, "/docs/a.txt");
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{IndexError, IndexResult};
pub use models::{
    etag::Etag,
    metadata::Metadata,
    query::{FileListing, ListFilesParams, SortDirection, SortKey},
    record::{FileRecord, UploadState, humane_size},
};
pub use services::{
    file_index::{FileIndex, IndexOptions},
    journal::RecordJournal,
};
