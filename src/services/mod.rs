//! Services operating on the file index.
//!
//! [`file_index::FileIndex`] owns the shared state; each sibling module adds
//! one family of operations to it:
//! - `folder_index`: virtual folder listings
//! - `query_engine`: file listings with pattern, sort and paging
//! - `upload_tracker`: resumable upload progress
//! - `rename_coordinator`: atomic renames
//! - `tombstone`: soft deletes
//!
//! `journal` persists records to SQLite, `name_locks` serializes writers.

pub mod file_index;
pub mod folder_index;
pub mod journal;
pub(crate) mod name_locks;
pub mod pattern;
pub mod query_engine;
pub mod rename_coordinator;
pub mod tombstone;
pub mod upload_tracker;
