//! Resumable upload progress.
//!
//! A record moves from created (no size known) through receiving (bytes
//! accumulating) to completed (all bytes in and a content hash stored). An
//! upload nobody finishes just stays incomplete; there is no timer here, an
//! external scanner decides when to give up using
//! [`FileIndex::incomplete_uploads`].

use super::file_index::{FileIndex, normalize_name};
use crate::{
    errors::{IndexError, IndexResult},
    models::{metadata::Metadata, record::FileRecord},
};
use chrono::Utc;
use tracing::{debug, warn};

impl FileIndex {
    /// Record `bytes` more received bytes for `name` and merge `delta` into
    /// its metadata, creating the record on first write.
    ///
    /// A completed file restarts only when the write brings bytes or a size.
    /// Anything else updates its metadata in place, and repeating the
    /// completing hash is a no-op.
    ///
    /// A delta that carries `Content-MD5` finishes the upload. Byte counts
    /// that would overrun the declared size are refused and leave the stored
    /// record untouched. Finishing with fewer bytes than declared keeps the
    /// received bytes (without the hash) and still reports `SizeMismatch`,
    /// so the caller can resume or discard the upload explicitly.
    pub async fn begin_or_continue_upload(
        &self,
        name: &str,
        mut delta: Metadata,
        bytes: u64,
    ) -> IndexResult<FileRecord> {
        let name = normalize_name(name)?;
        let _guard = self.locks.lock(&name).await;
        let now = Utc::now();

        let mut record = match self.live_record(&name) {
            Some(record) if record.is_upload_incomplete() => record,
            // No bytes and no size: a metadata update, or a retried completion.
            Some(record) if bytes == 0 && delta.size.is_none() => {
                if delta.content_md5.is_some()
                    && delta.content_md5 == record.metadata.content_md5
                    && delta.custom.is_empty()
                {
                    debug!(name = %name, "upload already completed with this hash");
                    return Ok(record);
                }
                record
            }
            Some(record) => {
                debug!(name = %name, "starting a new upload over a completed file");
                record.restarted()
            }
            None => FileRecord::new(
                name.clone(),
                Metadata {
                    creation_date: Some(now),
                    ..Metadata::default()
                },
            ),
        };

        let declared = delta.size.or(record.total_size);
        let Some(uploaded) = record.uploaded_size.checked_add(bytes) else {
            warn!(name = %name, bytes, "byte count overflows the upload counter");
            return Err(IndexError::SizeMismatch {
                name,
                declared: declared.unwrap_or(u64::MAX),
                uploaded: u64::MAX,
            });
        };
        if let Some(declared) = declared.filter(|declared| uploaded > *declared) {
            warn!(name = %name, declared, uploaded, "refusing bytes beyond declared size");
            return Err(IndexError::SizeMismatch {
                name,
                declared,
                uploaded,
            });
        }

        let content_md5 = delta.content_md5.take();
        record.metadata.apply(delta);
        record.total_size = declared;
        record.uploaded_size = uploaded;

        let mut short_by = None;
        if let Some(hash) = content_md5 {
            let total = *record.total_size.get_or_insert(uploaded);
            if total == uploaded {
                record.metadata.content_md5 = Some(hash);
            } else {
                short_by = Some(total);
            }
        }
        record.metadata.size = record.total_size;
        if record.metadata.creation_date.is_none() {
            record.metadata.creation_date = Some(now);
        }
        record.metadata.last_modified = Some(now);
        record.metadata.etag = Some(self.etags.next());

        self.store(&record).await?;

        match short_by {
            Some(declared) => {
                warn!(name = %name, declared, uploaded, "upload finished short of declared size");
                Err(IndexError::SizeMismatch {
                    name,
                    declared,
                    uploaded,
                })
            }
            None => {
                debug!(name = %name, uploaded, state = ?record.upload_state(), "upload progress");
                Ok(record)
            }
        }
    }
}
