//! Core data model of the file index.
//!
//! A [`FileRecord`](record::FileRecord) is keyed by its absolute virtual path.
//! Folders are never modelled; they are derived from record names at query
//! time. Everything here serializes as JSON via `serde`.

pub mod etag;
pub mod metadata;
pub mod query;
pub mod record;
