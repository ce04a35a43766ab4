use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::remote::model::{FileEntry, Folder};

/// Field the listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    CreatedAt,
    Size,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::CreatedAt => "Created",
            SortKey::Size => "Size",
        }
    }

    /// Cycle to the next sort key.
    pub fn next(&self) -> Self {
        match self {
            SortKey::Name => SortKey::CreatedAt,
            SortKey::CreatedAt => SortKey::Size,
            SortKey::Size => SortKey::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }

    fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Persisted sort settings, `{"key": "size", "direction": "desc"}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Case-folded name order with an exact-compare tie break, so the result is total.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Return a sorted copy of `files`. The input is left untouched.
pub fn sort_files(files: &[FileEntry], config: &SortConfig) -> Vec<FileEntry> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| {
        let ord = match config.key {
            SortKey::Name => compare_names(a.label(), b.label()),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Size => a.size.unwrap_or(0).cmp(&b.size.unwrap_or(0)),
        };
        config.direction.apply(ord)
    });
    sorted
}

/// Return a copy of `folders` ordered by name only.
pub fn sort_folders(folders: &[Folder], direction: SortDirection) -> Vec<Folder> {
    let mut sorted = folders.to_vec();
    sorted.sort_by(|a, b| direction.apply(compare_names(&a.name, &b.name)));
    sorted
}
