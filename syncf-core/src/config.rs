use gz_archive::GzipOptions;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the store folder created beside the installation root.
pub const STORE_DIR_NAME: &str = ".files";

/// Suffix shared by every archive in the store.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Environment variable the CLI reads to override the store location.
pub const STORE_DIR_ENV: &str = "SYNCF_STORE_DIR";

/// Where archives live. Threaded into the builder, catalog and cleaner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub store_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    /// Use `explicit` when given, otherwise the install-relative default.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        match explicit {
            Some(dir) => Self::new(dir),
            None => Self::new(default_store_dir()),
        }
    }

    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.store_dir.join(file_name)
    }
}

/// `<install root>/.files`, where the install root is two levels above the
/// real path of the running executable (`<root>/bin/syncf`).
///
/// Falls back to `./.files` when the executable path cannot be determined.
pub fn default_store_dir() -> PathBuf {
    install_root()
        .map(|root| root.join(STORE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(STORE_DIR_NAME))
}

fn install_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let real = fs::canonicalize(&exe).unwrap_or(exe);
    real.parent()?.parent().map(Path::to_path_buf)
}

/// Per-build settings.
#[derive(Clone, Debug)]
pub struct PackOptions {
    /// Emit one event per added item.
    pub verbose: bool,
    /// Gzip level, 0-9.
    pub compression_level: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            compression_level: 6,
        }
    }
}

impl PackOptions {
    pub fn gzip_options(&self) -> GzipOptions {
        GzipOptions {
            level: self.compression_level,
            ..GzipOptions::default()
        }
    }
}
