//! Archive creation.
//!
//! Each selected path is appended to a gzip-compressed tar stream in
//! selection order. A path that cannot be added becomes a [`SkipRecord`] and
//! the build goes on. A failing output stream is fatal, and so is a file
//! that cannot be read in full once its header has been written.

use crate::catalog::ensure_store_dir;
use crate::config::{PackOptions, StoreConfig, ARCHIVE_SUFFIX};
use crate::error::{Result, SyncfError};
use crate::enumerate::CatalogItem;
use crate::events::{Event, EventSink};
use crate::selection::Selection;
use chrono::{DateTime, Local};
use gz_archive::{encoder_failed, finish_encoder, GzipCodec, TrackedEncoder};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const FILE_NOT_FOUND: &str = "File not found";
pub const NOT_A_REGULAR_FILE: &str = "Not a regular file";

/// A selected path that did not make it into the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipRecord {
    pub path: String,
    pub reason: String,
}

/// Build report. Returned to the caller, never written to disk.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub archive_path: PathBuf,
    pub created_at: DateTime<Local>,
    pub files_added: usize,
    pub directories_added: usize,
    pub bytes_added: u64,
    pub skipped: Vec<SkipRecord>,
}

/// What happened to one selected path.
#[derive(Debug, PartialEq, Eq)]
enum ItemOutcome {
    File { size: u64 },
    Directory,
    /// Directory marker whose directory is gone; nothing to record.
    Ignored,
    Skipped(String),
}

/// Failure while appending one file entry.
#[derive(Debug)]
enum AppendError {
    /// Nothing reached the stream; the item can be skipped.
    BeforeHeader(io::Error),
    /// The header is already written; the stream is no longer consistent.
    InStream(io::Error),
}

/// Entry payload: exactly `remaining` bytes of `inner`.
///
/// Extra bytes are left unread. Running dry early is an error, because the
/// header already promised the full size.
struct Payload<R> {
    inner: R,
    remaining: u64,
    started: bool,
}

impl<R: Read> Payload<R> {
    fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            started: false,
        }
    }
}

impl<R: Read> Read for Payload<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.started = true;
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while packing, {} bytes missing", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Append a regular file entry whose size is already set in `header`.
fn append_file<W: Write, R: Read>(
    tar: &mut tar::Builder<W>,
    header: &mut tar::Header,
    name: &Path,
    reader: R,
) -> std::result::Result<(), AppendError> {
    let len = header.entry_size().map_err(AppendError::BeforeHeader)?;
    let mut payload = Payload::new(reader, len);
    match tar.append_data(header, name, &mut payload) {
        Ok(()) => Ok(()),
        Err(e) if payload.started => Err(AppendError::InStream(e)),
        Err(e) => Err(AppendError::BeforeHeader(e)),
    }
}

/// `<name>_<YYYYMMDD_HHMMSS>.tar.gz`
pub fn archive_file_name(name: &str, at: &DateTime<Local>) -> String {
    format!("{}_{}{}", name, at.format("%Y%m%d_%H%M%S"), ARCHIVE_SUFFIX)
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(SyncfError::InvalidArchiveName(name.to_string()));
    }
    Ok(())
}

pub struct ArchiveBuilder {
    root: PathBuf,
    store: StoreConfig,
    options: PackOptions,
}

impl ArchiveBuilder {
    /// `root` is the directory selection paths are relative to.
    pub fn new(root: impl Into<PathBuf>, store: StoreConfig, options: PackOptions) -> Self {
        Self {
            root: root.into(),
            store,
            options,
        }
    }

    /// Build an archive stamped with the current local time.
    pub fn build(&self, selection: &Selection, name: &str, sink: &dyn EventSink) -> Result<Manifest> {
        self.build_at(selection, name, Local::now(), sink)
    }

    /// Build an archive stamped with `at`.
    ///
    /// An existing archive with the same name and timestamp is overwritten.
    pub fn build_at(
        &self,
        selection: &Selection,
        name: &str,
        at: DateTime<Local>,
        sink: &dyn EventSink,
    ) -> Result<Manifest> {
        validate_name(name)?;

        let store_dir = &self.store.store_dir;
        if ensure_store_dir(store_dir)? {
            sink.emit(&Event::StoreCreated { path: store_dir });
        }

        let archive_path = self.store.archive_path(&archive_file_name(name, &at));
        let file = File::create(&archive_path).map_err(|e| SyncfError::ArchiveOpenFailure {
            path: archive_path.clone(),
            source: e,
        })?;

        let total = selection.len();
        log::info!("packing {} items into {}", total, archive_path.display());
        sink.emit(&Event::PackStarted {
            archive: &archive_path,
            total,
        });

        let codec = GzipCodec::new(self.options.gzip_options());
        let mut tar = tar::Builder::new(codec.encoder(file));

        let mut manifest = Manifest {
            archive_path: archive_path.clone(),
            created_at: at,
            files_added: 0,
            directories_added: 0,
            bytes_added: 0,
            skipped: Vec::new(),
        };

        for (idx, entry) in selection.items().iter().enumerate() {
            let item = entry.path.as_str();
            let outcome = match self.add_item(&mut tar, entry) {
                Ok(outcome) => outcome,
                Err(AppendError::BeforeHeader(e)) | Err(AppendError::InStream(e)) => {
                    return Err(SyncfError::ArchiveWriteFailure {
                        path: archive_path,
                        source: io::Error::new(e.kind(), format!("{}: {}", item, e)),
                    });
                }
            };

            match outcome {
                ItemOutcome::File { size } => {
                    manifest.files_added += 1;
                    manifest.bytes_added += size;
                    if self.options.verbose {
                        sink.emit(&Event::ItemAdded { path: item, size });
                    }
                }
                ItemOutcome::Directory => {
                    manifest.directories_added += 1;
                    if self.options.verbose {
                        sink.emit(&Event::DirectoryAdded { path: item });
                    }
                }
                ItemOutcome::Ignored => {
                    log::debug!("directory {} vanished before packing", item);
                }
                ItemOutcome::Skipped(reason) => {
                    log::warn!("skipping {}: {}", item, reason);
                    let record = SkipRecord {
                        path: item.to_string(),
                        reason,
                    };
                    sink.emit(&Event::ItemSkipped { record: &record });
                    manifest.skipped.push(record);
                }
            }

            sink.emit(&Event::Progress {
                done: idx + 1,
                total,
            });
        }

        let write_failure = |e: io::Error| SyncfError::ArchiveWriteFailure {
            path: archive_path.clone(),
            source: e,
        };
        let encoder = tar.into_inner().map_err(write_failure)?;
        finish_encoder(encoder).map_err(write_failure)?;

        log::info!(
            "packed {} files ({} bytes), {} skipped",
            manifest.files_added,
            manifest.bytes_added,
            manifest.skipped.len()
        );
        sink.emit(&Event::PackFinished {
            manifest: &manifest,
        });

        Ok(manifest)
    }

    /// Any error returned here is fatal for the archive: either the output
    /// stream failed or an entry was cut short. Recoverable per-item problems
    /// come back as [`ItemOutcome::Skipped`].
    fn add_item(
        &self,
        tar: &mut tar::Builder<TrackedEncoder<File>>,
        item: &CatalogItem,
    ) -> std::result::Result<ItemOutcome, AppendError> {
        let full = self.root.join(&item.rel);

        if item.is_dir() {
            return match fs::metadata(&full) {
                Ok(meta) if meta.is_dir() => {
                    // Header only: descendants are selected on their own.
                    let mut header = tar::Header::new_gnu();
                    header.set_metadata(&meta);
                    header.set_size(0);
                    tar.append_data(&mut header, &item.rel, io::empty())
                        .map_err(AppendError::InStream)?;
                    Ok(ItemOutcome::Directory)
                }
                Ok(_) => Ok(ItemOutcome::Ignored),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ItemOutcome::Ignored),
                Err(e) => Ok(ItemOutcome::Skipped(e.to_string())),
            };
        }

        // Stat before opening: opening a FIFO would block.
        match fs::metadata(&full) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(ItemOutcome::Skipped(NOT_A_REGULAR_FILE.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ItemOutcome::Skipped(FILE_NOT_FOUND.to_string()));
            }
            Err(e) => return Ok(ItemOutcome::Skipped(e.to_string())),
        }

        let file = match File::open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ItemOutcome::Skipped(FILE_NOT_FOUND.to_string()));
            }
            Err(e) => return Ok(ItemOutcome::Skipped(e.to_string())),
        };
        let meta = match file.metadata() {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(ItemOutcome::Skipped(NOT_A_REGULAR_FILE.to_string())),
            Err(e) => return Ok(ItemOutcome::Skipped(e.to_string())),
        };

        let mut header = tar::Header::new_gnu();
        header.set_metadata(&meta);
        match append_file(tar, &mut header, &item.rel, file) {
            Ok(()) => Ok(ItemOutcome::File { size: meta.len() }),
            Err(AppendError::BeforeHeader(e)) if !encoder_failed(tar.get_ref()) => {
                Ok(ItemOutcome::Skipped(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
