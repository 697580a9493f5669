use crate::config::{StoreConfig, ARCHIVE_SUFFIX};
use crate::error::{Result, SyncfError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Snapshot of one archive in the store, taken at listing time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// Result of listing the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogListing {
    /// The store did not exist; it has been created and is empty.
    StoreCreated,
    /// The store exists but holds no archives.
    Empty,
    /// Archives, most recent first.
    Archives(Vec<ArchiveInfo>),
}

impl CatalogListing {
    pub fn archives(&self) -> &[ArchiveInfo] {
        match self {
            Self::Archives(list) => list,
            Self::StoreCreated | Self::Empty => &[],
        }
    }

    pub fn into_archives(self) -> Vec<ArchiveInfo> {
        match self {
            Self::Archives(list) => list,
            Self::StoreCreated | Self::Empty => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.archives().is_empty()
    }
}

/// Read-only view over the archives in a store directory.
pub struct ArchiveCatalog {
    store: StoreConfig,
}

impl ArchiveCatalog {
    pub fn new(store: StoreConfig) -> Self {
        Self { store }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store.store_dir
    }

    /// List archives, creating the store when it is missing.
    pub fn list(&self) -> Result<CatalogListing> {
        let dir = self.store_dir();
        if ensure_store_dir(dir)? {
            return Ok(CatalogListing::StoreCreated);
        }

        let archives = scan_store(dir)?.unwrap_or_default();
        if archives.is_empty() {
            Ok(CatalogListing::Empty)
        } else {
            Ok(CatalogListing::Archives(archives))
        }
    }

    /// Resolve an archive by exact file name or by 1-based position in the
    /// listing.
    pub fn find(&self, selector: &str) -> Result<ArchiveInfo> {
        let archives = self.list()?.into_archives();

        if let Some(hit) = archives.iter().find(|a| a.name == selector) {
            return Ok(hit.clone());
        }

        selector
            .parse::<usize>()
            .ok()
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| archives.get(idx).cloned())
            .ok_or_else(|| SyncfError::ArchiveNotInCatalog(selector.to_string()))
    }
}

/// Create `dir` when absent. Returns `true` when it was created.
pub(crate) fn ensure_store_dir(dir: &Path) -> Result<bool> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(SyncfError::StoreDirUnavailable {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "not a directory"),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| SyncfError::StoreDirUnavailable {
                path: dir.to_path_buf(),
                source: e,
            })?;
            log::info!("created store directory {}", dir.display());
            Ok(true)
        }
        Err(e) => Err(SyncfError::StoreDirUnavailable {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// List `*.tar.gz` files in `dir` without creating anything.
///
/// Returns `None` when the directory does not exist. Entries that cannot be
/// stat'ed are logged and left out.
pub(crate) fn scan_store(dir: &Path) -> Result<Option<Vec<ArchiveInfo>>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SyncfError::StoreDirUnavailable {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let base = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mut archives = Vec::new();

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("failed to read entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(ARCHIVE_SUFFIX) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("could not stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        archives.push(ArchiveInfo {
            path: base.join(&name),
            name,
            size: meta.len(),
            modified: DateTime::from(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
        });
    }

    archives.sort_by(recent_first);
    Ok(Some(archives))
}

fn recent_first(a: &ArchiveInfo, b: &ArchiveInfo) -> Ordering {
    b.modified
        .cmp(&a.modified)
        .then_with(|| a.name.cmp(&b.name))
}
