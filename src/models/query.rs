//! Parameters and results of file listings.

use super::record::FileRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    /// Declared total size; unknown sizes order first.
    Size,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            other => Err(format!("unknown sort key `{other}` (expected name or size)")),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction `{other}` (expected asc or desc)")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ListFilesParams {
    /// Folder to list; `/`, `""`, `test`, `/test/` are all accepted.
    pub folder: String,
    /// `*`/`?` wildcard pattern on the leaf name; without wildcards a
    /// starts-with match.
    pub pattern: Option<String>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub start: usize,
    pub page_size: usize,
}

impl ListFilesParams {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            pattern: None,
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            start: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.sort_direction = direction;
        self
    }

    pub fn page(mut self, start: usize, page_size: usize) -> Self {
        self.start = start;
        self.page_size = page_size;
        self
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 1024;

#[derive(Serialize, Debug)]
pub struct FileListing {
    pub files: Vec<FileRecord>,
    /// Matches before pagination.
    pub total: usize,
}
