use crate::catalog::scan_store;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::events::{Event, EventSink};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An archive that could not be removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// `false` when the store directory did not exist.
    pub store_found: bool,
    pub deleted: Vec<String>,
    pub freed_bytes: u64,
    pub failures: Vec<DeletionFailure>,
}

impl CleanupReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Delete every archive in the store.
///
/// Failing to delete one archive is recorded and the rest are still removed.
/// Only an unreadable store directory is an error; a missing one is a no-op.
pub fn delete_archives(store: &StoreConfig, sink: &dyn EventSink) -> Result<CleanupReport> {
    delete_with(store, sink, |path| fs::remove_file(path))
}

fn delete_with<F>(store: &StoreConfig, sink: &dyn EventSink, remove: F) -> Result<CleanupReport>
where
    F: Fn(&Path) -> io::Result<()>,
{
    let Some(archives) = scan_store(&store.store_dir)? else {
        log::info!("store {} does not exist, nothing to clean", store.store_dir.display());
        return Ok(CleanupReport::default());
    };

    let mut report = CleanupReport {
        store_found: true,
        ..CleanupReport::default()
    };
    if archives.is_empty() {
        return Ok(report);
    }

    let total_bytes = archives.iter().map(|a| a.size).sum();
    sink.emit(&Event::CleanStarted {
        count: archives.len(),
        total_bytes,
    });

    for archive in archives {
        match remove(&archive.path) {
            Ok(()) => {
                log::debug!("deleted {}", archive.path.display());
                sink.emit(&Event::ArchiveDeleted {
                    name: &archive.name,
                    size: archive.size,
                });
                report.freed_bytes += archive.size;
                report.deleted.push(archive.name);
            }
            Err(e) => {
                log::warn!("failed to delete {}: {}", archive.path.display(), e);
                let failure = DeletionFailure {
                    path: archive.path,
                    reason: e.to_string(),
                };
                sink.emit(&Event::DeletionFailed { failure: &failure });
                report.failures.push(failure);
            }
        }
    }

    Ok(report)
}
