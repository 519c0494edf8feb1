//! Represents system and user-defined metadata attached to file records.

use super::etag::Etag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const LAST_MODIFIED: &str = "Last-Modified";
pub const CREATION_DATE: &str = "Creation-Date";
pub const ETAG: &str = "ETag";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const SIZE: &str = "RavenFS-Size";
pub const DELETE_MARKER: &str = "Raven-Delete-Marker";

/// Metadata of a single file record.
///
/// Well-known system keys are typed fields; anything else lands in `custom`.
/// Serializes to one flat JSON object keyed by the wire names above.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    #[serde(rename = "Last-Modified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(rename = "Creation-Date", default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,

    /// Version token, replaced on every mutation.
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<Etag>,

    /// Content hash; present only once an upload completed.
    #[serde(rename = "Content-MD5", default, skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,

    /// Declared total size in bytes.
    #[serde(rename = "RavenFS-Size", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Tombstone flag.
    #[serde(rename = "Raven-Delete-Marker", default, skip_serializing_if = "is_false")]
    pub delete_marker: bool,

    #[serde(flatten)]
    pub custom: BTreeMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Metadata {
    /// Metadata that only declares the total size of an upload.
    pub fn with_size(size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Metadata that only carries the content hash, marking an upload done.
    pub fn with_content_md5(hash: impl Into<String>) -> Self {
        Self {
            content_md5: Some(hash.into()),
            ..Self::default()
        }
    }

    /// Merge a caller-supplied delta into this metadata.
    ///
    /// `ETag`, `Last-Modified` and the delete marker are owned by the index
    /// and are never taken from a delta.
    pub fn apply(&mut self, delta: Metadata) {
        if delta.creation_date.is_some() {
            self.creation_date = delta.creation_date;
        }
        if delta.content_md5.is_some() {
            self.content_md5 = delta.content_md5;
        }
        if delta.size.is_some() {
            self.size = delta.size;
        }
        self.custom.extend(delta.custom);
    }
}
