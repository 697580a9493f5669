use crate::error::{Result, SyncfError};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Directory,
}

/// A path below the working root.
///
/// `path` uses POSIX separators, ends in `/` for directories and is what rules
/// match against. `rel` is the path as found on disk and is used for file
/// access and entry names, so names that are not valid UTF-8 survive intact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogItem {
    pub path: String,
    pub rel: PathBuf,
    pub kind: ItemKind,
}

impl CatalogItem {
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            rel: PathBuf::from(&path),
            path,
            kind: ItemKind::File,
        }
    }

    /// `path` may be given with or without the trailing slash.
    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            rel: PathBuf::from(path.trim_end_matches('/')),
            path,
            kind: ItemKind::Directory,
        }
    }

    /// Directory when `path` ends in `/`, file otherwise.
    pub fn from_posix(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.ends_with('/') {
            Self::directory(path)
        } else {
            Self::file(path)
        }
    }

    fn from_disk(rel: &Path, is_dir: bool) -> Self {
        let mut path = posix_path(rel);
        let kind = if is_dir {
            path.push('/');
            ItemKind::Directory
        } else {
            ItemKind::File
        };
        Self {
            path,
            rel: rel.to_path_buf(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Directory
    }
}

/// List every file and directory below `root`, relative to it.
///
/// Entries are visited in file-name order so a fixed tree always yields the
/// same sequence. Symlinks are not followed and are reported as files.
/// Unreadable subtrees are logged and skipped.
pub fn enumerate(root: &Path) -> Result<Vec<CatalogItem>> {
    let meta = std::fs::metadata(root).map_err(|e| SyncfError::WalkFailed {
        root: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(SyncfError::WalkFailed {
            root: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        items.push(CatalogItem::from_disk(rel, entry.file_type().is_dir()));
    }

    log::debug!("enumerated {} items under {}", items.len(), root.display());
    Ok(items)
}

/// Lossy for names that are not valid UTF-8; `CatalogItem::rel` keeps the
/// real name.
fn posix_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
