//! Represents a file record, the unit the index stores, keyed by its name.

use super::{etag::Etag, metadata::Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

/// Metadata of a single file in the virtual file system.
///
/// `name` is the absolute virtual path (`/photos/2025/img.jpg`) and the
/// record's identity. The payload bytes live elsewhere; this record only
/// tracks how much of them has been received.
///
/// Equality is structural (name, sizes and the full metadata), which is what
/// change detection wants. Use [`FileRecord::same_file`] to compare identity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub name: String,

    pub metadata: Metadata,

    /// Declared size in bytes, `None` until an upload declares it.
    pub total_size: Option<u64>,

    /// Bytes received so far.
    pub uploaded_size: u64,
}

/// Observable progress of a resumable upload.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    /// Nothing received and no size declared yet.
    Created,
    /// Bytes are arriving, or stopped arriving (a broken upload looks the same).
    Receiving,
    Completed,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        let total_size = metadata.size;
        Self {
            name: name.into(),
            metadata,
            total_size,
            uploaded_size: 0,
        }
    }

    pub fn same_file(&self, other: &FileRecord) -> bool {
        self.name == other.name
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.metadata.last_modified.unwrap_or_default()
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.metadata.creation_date.unwrap_or_default()
    }

    pub fn etag(&self) -> Option<Etag> {
        self.metadata.etag
    }

    /// Last path segment of the name.
    pub fn leaf_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Text after the last `.` of the leaf name, if any.
    pub fn extension(&self) -> Option<&str> {
        self.leaf_name().rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Text before the last `/` of the name; empty for root-level files.
    pub fn path(&self) -> &str {
        self.name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    pub fn is_deleted(&self) -> bool {
        self.metadata.delete_marker
    }

    pub fn has_content_hash(&self) -> bool {
        self.metadata.content_md5.is_some()
    }

    /// True while an upload is in flight or was abandoned half way.
    pub fn is_upload_incomplete(&self) -> bool {
        match self.total_size {
            None => true,
            Some(total) => {
                total != self.uploaded_size || (!self.is_deleted() && !self.has_content_hash())
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_size == Some(self.uploaded_size) && self.has_content_hash() && !self.is_deleted()
    }

    pub fn upload_state(&self) -> UploadState {
        if self.is_complete() {
            UploadState::Completed
        } else if self.total_size.is_none() && self.uploaded_size == 0 {
            UploadState::Created
        } else {
            UploadState::Receiving
        }
    }

    pub fn humane_total_size(&self) -> Option<String> {
        humane_size(self.total_size.map(|size| i64::try_from(size).unwrap_or(i64::MAX)))
    }

    /// Copy of this record with upload progress reset, ready for a new upload
    /// over the same name. Creation date and custom keys survive.
    pub(crate) fn restarted(&self) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.content_md5 = None;
        metadata.size = None;
        Self {
            name: self.name.clone(),
            metadata,
            total_size: None,
            uploaded_size: 0,
        }
    }
}

/// Render a byte count for humans: `1.5 KBytes`, `2,048 Bytes`.
///
/// Units switch only when the absolute size is strictly greater than the
/// 1024-power boundary, so exactly 1024 bytes stays `1,024 Bytes`.
pub fn humane_size(size: Option<i64>) -> Option<String> {
    let size = size?;
    let abs = size.unsigned_abs();
    let (divisor, unit) = if abs > GB {
        (GB, "GBytes")
    } else if abs > MB {
        (MB, "MBytes")
    } else if abs > KB {
        (KB, "KBytes")
    } else {
        let sign = if size < 0 { "-" } else { "" };
        return Some(format!("{sign}{} Bytes", group_thousands(abs)));
    };
    Some(format!("{} {unit}", two_decimals(size as f64 / divisor as f64)))
}

/// At most two fraction digits, trailing zeros dropped, halves rounded away from zero.
fn two_decimals(value: f64) -> String {
    let hundredths = (value.abs() * 100.0).round() as u64;
    let (whole, frac) = (hundredths / 100, hundredths % 100);
    let mut out = String::new();
    if value < 0.0 && hundredths > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if frac % 10 == 0 && frac != 0 {
        out.push_str(&format!(".{}", frac / 10));
    } else if frac != 0 {
        out.push_str(&format!(".{frac:02}"));
    }
    out
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
