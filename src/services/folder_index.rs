//! Virtual folders derived from the live name set.
//!
//! Nothing about folders is stored. A folder exists while at least one live
//! record sits somewhere beneath it, and only the level directly below the
//! queried prefix is ever reported.

use super::file_index::{FileIndex, normalize_folder};
use crate::errors::IndexResult;
use std::{collections::BTreeSet, ops::Bound};

impl FileIndex {
    /// List the immediate child folders of `prefix`, sorted and paged.
    ///
    /// Returned paths are absolute with no trailing `/`. Once a child folder
    /// is found the scan jumps past its whole subtree (`folder/` up to
    /// `folder0`, `0` being the character after `/`).
    pub fn list_folders(
        &self,
        prefix: &str,
        start: usize,
        page_size: usize,
    ) -> IndexResult<Vec<String>> {
        let prefix = normalize_folder(prefix)?;
        let lower = format!("{prefix}/");
        let upper = format!("{prefix}0");

        let mut folders = BTreeSet::new();
        let records = self.records.read();
        let mut cursor = lower.clone();
        loop {
            let next = records
                .range::<str, _>((Bound::Included(cursor.as_str()), Bound::Excluded(upper.as_str())))
                .filter(|(_, record)| !record.is_deleted())
                .find_map(|(name, _)| {
                    name[lower.len()..]
                        .split_once('/')
                        .map(|(segment, _)| format!("{lower}{segment}"))
                });
            let Some(folder) = next else { break };
            cursor = format!("{folder}0");
            folders.insert(folder);
        }
        drop(records);

        Ok(folders.into_iter().skip(start).take(page_size).collect())
    }
}
