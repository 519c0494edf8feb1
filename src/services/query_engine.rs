//! File listings: the records directly inside one folder, filtered by a
//! leaf-name pattern, sorted and paged.

use super::{
    file_index::{FileIndex, normalize_folder},
    pattern::NamePattern,
};
use crate::{
    errors::IndexResult,
    models::{
        query::{FileListing, ListFilesParams, SortDirection, SortKey},
        record::FileRecord,
    },
};
use std::ops::Bound;
use tracing::debug;

impl FileIndex {
    /// List live files directly inside `params.folder`.
    ///
    /// Nested files are never flattened into the listing, tombstones are
    /// dropped before the pattern runs, and a `start` past the end simply
    /// yields an empty page.
    pub fn list_files(&self, params: &ListFilesParams) -> IndexResult<FileListing> {
        let folder = normalize_folder(&params.folder)?;
        let pattern = params
            .pattern
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| NamePattern::compile(pattern, self.options.case_sensitive_search))
            .transpose()?;

        let lower = format!("{folder}/");
        let upper = format!("{folder}0");
        let mut matches: Vec<FileRecord> = self
            .records
            .read()
            .range::<str, _>((Bound::Included(lower.as_str()), Bound::Excluded(upper.as_str())))
            .filter(|(name, _)| !name[lower.len()..].contains('/'))
            .map(|(_, record)| record)
            .filter(|record| !record.is_deleted())
            .filter(|record| {
                pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.matches(record.leaf_name()))
            })
            .cloned()
            .collect();

        sort_records(&mut matches, params.sort_key, params.sort_direction);

        let total = matches.len();
        let files = matches
            .into_iter()
            .skip(params.start)
            .take(params.page_size)
            .collect::<Vec<_>>();
        debug!(folder = %folder, total, returned = files.len(), "listed files");
        Ok(FileListing { files, total })
    }
}

/// Stable sort; ties keep name order.
fn sort_records(records: &mut [FileRecord], key: SortKey, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Size => a.total_size.cmp(&b.total_size),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}
