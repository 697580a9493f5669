//! Archive extraction.
//!
//! Extraction is all-or-nothing at the stream level: the first unreadable
//! entry or failed write aborts the rest. Permission bits and timestamps
//! stored in the archive are not restored. Symlinks already on disk, including
//! ones created by earlier entries, are never followed out of the
//! destination.

use crate::error::{Result, SyncfError};
use crate::events::{Event, EventSink};
use gz_archive::{GzipCodec, GzipOptions, WriteTracker};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The caller did not confirm; nothing was written.
    Cancelled,
    Extracted { files: usize, directories: usize },
}

/// Unpack `archive` into `dest` once `confirmed`.
pub fn extract(
    archive: &Path,
    dest: &Path,
    confirmed: bool,
    sink: &dyn EventSink,
) -> Result<ExtractOutcome> {
    if !confirmed {
        log::info!("extraction of {} cancelled", archive.display());
        return Ok(ExtractOutcome::Cancelled);
    }

    let corrupt = |e: io::Error| SyncfError::ArchiveCorrupt {
        path: archive.to_path_buf(),
        source: e,
    };

    let file = File::open(archive).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SyncfError::ArchiveNotFound(archive.to_path_buf()),
        _ => corrupt(e),
    })?;

    let dest_real = fs::canonicalize(dest).map_err(|e| SyncfError::ExtractionFailure {
        entry: dest.display().to_string(),
        source: e,
    })?;

    sink.emit(&Event::UnpackStarted { archive });
    log::info!("unpacking {} into {}", archive.display(), dest.display());

    let codec = GzipCodec::new(GzipOptions::default());
    let mut tar = tar::Archive::new(codec.decoder(file));

    let mut files = 0usize;
    let mut directories = 0usize;

    for entry in tar.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() {
            continue;
        }

        let raw = entry.path().map_err(corrupt)?.into_owned();
        let display = raw.to_string_lossy().into_owned();
        let rel = safe_relative(&raw).ok_or_else(|| SyncfError::UnsafeEntryPath(display.clone()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(&rel);
        let failed = |e: io::Error| SyncfError::ExtractionFailure {
            entry: display.clone(),
            source: e,
        };

        // Directories must not resolve outside `dest` at all; for other
        // entries only the parents matter, the final name is replaced.
        let depth = rel.components().count();
        let checked = if kind.is_dir() { depth } else { depth - 1 };
        if !links_stay_inside(&dest_real, dest, &rel, checked).map_err(failed)? {
            return Err(SyncfError::UnsafeEntryPath(display.clone()));
        }

        if kind.is_dir() {
            fs::create_dir_all(&target).map_err(failed)?;
            directories += 1;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(failed)?;
            }
            if fs::symlink_metadata(&target).is_ok_and(|m| m.file_type().is_symlink()) {
                fs::remove_file(&target).map_err(failed)?;
            }

            if kind.is_file() {
                let mut out = WriteTracker::new(File::create(&target).map_err(failed)?);
                if let Err(e) = io::copy(&mut entry, &mut out) {
                    return Err(if out.has_failed() { failed(e) } else { corrupt(e) });
                }
            } else {
                // Links and special files: tar's sandboxed unpack, minus metadata.
                entry.set_preserve_permissions(false);
                entry.set_preserve_mtime(false);
                if !entry.unpack_in(dest).map_err(failed)? {
                    return Err(SyncfError::UnsafeEntryPath(display.clone()));
                }
            }
            files += 1;
        }

        sink.emit(&Event::EntryUnpacked {
            path: &display,
            is_dir: kind.is_dir(),
        });
    }

    log::info!("unpacked {} files, {} directories", files, directories);
    Ok(ExtractOutcome::Extracted { files, directories })
}

/// Strip `.` components; reject absolute paths and `..`.
fn safe_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Walk the first `count` components of `rel` below `dest`. Every existing
/// symlink on the way must resolve inside `dest_real`; dangling ones are
/// refused. Stops at the first component that does not exist yet.
fn links_stay_inside(dest_real: &Path, dest: &Path, rel: &Path, count: usize) -> io::Result<bool> {
    let mut current = dest.to_path_buf();
    for part in rel.components().take(count) {
        current.push(part);
        let meta = match fs::symlink_metadata(&current) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e),
        };
        if meta.file_type().is_symlink() {
            match fs::canonicalize(&current) {
                Ok(real) if real.starts_with(dest_real) => {}
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }
    Ok(true)
}
