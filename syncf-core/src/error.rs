use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the selection and archive pipeline.
///
/// Per-item problems (a selected file vanished, one archive could not be
/// deleted) are not errors; they are collected into the returned report.
#[derive(Debug, Error)]
pub enum SyncfError {
    #[error("rule file not found: {}", .0.display())]
    RuleFileMissing(PathBuf),

    #[error("failed to read rule file {}: {source}", .path.display())]
    RuleFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rule set has no include patterns")]
    EmptyIncludeRules,

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to walk {}: {reason}", .root.display())]
    WalkFailed { root: PathBuf, reason: String },

    #[error("no files matched the rules")]
    NoMatchingFiles,

    #[error("invalid archive name '{0}'")]
    InvalidArchiveName(String),

    #[error("failed to create archive {}: {source}", .path.display())]
    ArchiveOpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write archive {}: {source}", .path.display())]
    ArchiveWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("no archive matching '{0}' in store")]
    ArchiveNotInCatalog(String),

    #[error("archive {} is corrupt: {source}", .path.display())]
    ArchiveCorrupt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract {entry}: {source}")]
    ExtractionFailure {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("refusing to unpack entry outside destination: {0}")]
    UnsafeEntryPath(String),

    #[error("store directory {} is unavailable: {source}", .path.display())]
    StoreDirUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyncfError>;
