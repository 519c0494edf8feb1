//! Handlers for the operator subcommands.
//! Each one translates CLI input into index calls and prints the result as
//! JSON on stdout; logs go to stderr through `tracing`.

use crate::config::{AppConfig, Command};
use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use filestore_index::{FileIndex, FileRecord, ListFilesParams, Metadata, UploadState};
use md5::Context;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::info;

/// A record plus the values derived from it, as printed by the CLI.
#[derive(Serialize)]
struct RecordView<'a> {
    #[serde(flatten)]
    record: &'a FileRecord,
    path: &'a str,
    extension: Option<&'a str>,
    humane_total_size: Option<String>,
    upload_state: UploadState,
    upload_incomplete: bool,
    last_modified: DateTime<Utc>,
    creation_date: DateTime<Utc>,
}

impl<'a> From<&'a FileRecord> for RecordView<'a> {
    fn from(record: &'a FileRecord) -> Self {
        Self {
            record,
            path: record.path(),
            extension: record.extension(),
            humane_total_size: record.humane_total_size(),
            upload_state: record.upload_state(),
            upload_incomplete: record.is_upload_incomplete(),
            last_modified: record.last_modified(),
            creation_date: record.creation_date(),
        }
    }
}

#[derive(Serialize)]
struct ListingView<'a> {
    files: Vec<RecordView<'a>>,
    total: usize,
}

pub async fn dispatch(index: &FileIndex, cfg: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Migrate => bail!("migrations run before the index is opened"),
        Command::Folders {
            prefix,
            start,
            limit,
        } => {
            let folders = index.list_folders(&prefix, start, limit.unwrap_or(cfg.page_size))?;
            print_json(&folders)
        }
        Command::Ls {
            folder,
            pattern,
            sort,
            order,
            start,
            limit,
        } => {
            let mut params = ListFilesParams::new(folder)
                .sort(sort, order)
                .page(start, limit.unwrap_or(cfg.page_size));
            params.pattern = pattern;
            let listing = index.list_files(&params)?;
            print_json(&ListingView {
                files: listing.files.iter().map(RecordView::from).collect(),
                total: listing.total,
            })
        }
        Command::Stat { name } => {
            let record = index.get_record(&name)?;
            print_json(&RecordView::from(&record))
        }
        Command::Upload {
            name,
            file,
            chunk_size,
            metadata,
        } => {
            let record = upload_file(index, &name, &file, chunk_size, metadata).await?;
            print_json(&RecordView::from(&record))
        }
        Command::Mv { old_name, new_name } => {
            let record = index.rename(&old_name, &new_name).await?;
            print_json(&RecordView::from(&record))
        }
        Command::Rm { name } => {
            let record = index.delete(&name).await?;
            print_json(&RecordView::from(&record))
        }
        Command::Incomplete => print_json(&index.incomplete_uploads()),
    }
}

/// Stream a local file through the upload tracker.
///
/// - Declares the file size and extra metadata first.
/// - Records progress once per chunk while computing the MD5.
/// - Finishes with `Content-MD5`, which completes the record.
///
/// If a live, unfinished record with the same declared size exists, the
/// bytes it already counted are hashed but not recorded again.
async fn upload_file(
    index: &FileIndex,
    name: &str,
    path: &Path,
    chunk_size: usize,
    metadata: Vec<(String, String)>,
) -> Result<FileRecord> {
    if chunk_size == 0 {
        bail!("chunk size must be greater than zero");
    }
    let mut file = File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    let total = file.metadata().await?.len();

    let resume_from = match index.get_record(name) {
        Ok(existing) if !existing.is_deleted() && existing.is_upload_incomplete() => {
            if existing.total_size.is_some_and(|size| size != total) {
                bail!(
                    "`{}` has an unfinished upload of {} bytes; remove it before uploading {} bytes",
                    existing.name,
                    existing.total_size.unwrap_or_default(),
                    total
                );
            }
            existing.uploaded_size
        }
        _ => 0,
    };
    if resume_from > 0 {
        info!("Resuming upload of {} at byte {}", name, resume_from);
    }

    let mut declaration = Metadata::with_size(total);
    declaration.custom = metadata
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    index.begin_or_continue_upload(name, declaration, 0).await?;

    let mut digest = Context::new();
    let mut buf = vec![0u8; chunk_size];
    let mut offset: u64 = 0;
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        digest.consume(&buf[..read]);
        let chunk_end = offset + read as u64;
        if chunk_end > resume_from {
            let fresh = chunk_end - offset.max(resume_from);
            index
                .begin_or_continue_upload(name, Metadata::default(), fresh)
                .await?;
        }
        offset = chunk_end;
    }

    let hash = format!("{:x}", digest.compute());
    let record = index
        .begin_or_continue_upload(name, Metadata::with_content_md5(hash), 0)
        .await?;
    info!("Uploaded {} ({} bytes)", record.name, offset);
    Ok(record)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestore_index::IndexOptions;
    use std::io::Write;

    fn local_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn uploads_local_file_in_chunks() {
        let index = FileIndex::new(IndexOptions::default());
        let file = local_file(b"hello world");

        let record = upload_file(
            &index,
            "docs/hello.txt",
            file.path(),
            4,
            vec![("Owner".into(), "ops".into())],
        )
        .await
        .unwrap();

        assert!(record.is_complete());
        assert_eq!(record.total_size, Some(11));
        assert_eq!(
            record.metadata.content_md5.as_deref(),
            Some(format!("{:x}", md5::compute(b"hello world")).as_str())
        );
        assert_eq!(record.metadata.custom["Owner"], Value::String("ops".into()));
    }

    #[tokio::test]
    async fn resumes_broken_upload() {
        let index = FileIndex::new(IndexOptions::default());
        let file = local_file(b"0123456789");
        index
            .begin_or_continue_upload("a.bin", Metadata::with_size(10), 6)
            .await
            .unwrap();

        let record = upload_file(&index, "a.bin", file.path(), 4, Vec::new())
            .await
            .unwrap();
        assert_eq!(record.uploaded_size, 10);
        assert!(record.is_complete());
    }

    #[tokio::test]
    async fn refuses_to_resume_different_size() {
        let index = FileIndex::new(IndexOptions::default());
        let file = local_file(b"0123");
        index
            .begin_or_continue_upload("a.bin", Metadata::with_size(10), 2)
            .await
            .unwrap();
        assert!(upload_file(&index, "a.bin", file.path(), 4, Vec::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn empty_file_completes() {
        let index = FileIndex::new(IndexOptions::default());
        let file = local_file(b"");
        let record = upload_file(&index, "empty", file.path(), 4, Vec::new())
            .await
            .unwrap();
        assert!(record.is_complete());
        assert_eq!(record.total_size, Some(0));
    }

    #[test]
    fn record_view_carries_derived_fields() {
        let record = FileRecord::new("/docs/a.txt", Metadata::with_size(2048));
        let value = serde_json::to_value(RecordView::from(&record)).unwrap();
        assert_eq!(value["name"], "/docs/a.txt");
        assert_eq!(value["path"], "/docs");
        assert_eq!(value["extension"], "txt");
        assert_eq!(value["humane_total_size"], "2 KBytes");
        assert_eq!(value["upload_state"], "receiving");
    }
}
