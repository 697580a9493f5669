//! syncf core: pick files with gitignore-style rules and keep them in
//! timestamped `.tar.gz` archives.
//!
//! Pipeline: [`rules`] compiles a rule file, [`enumerate`] walks the working
//! tree, [`selection`] applies the rules, [`builder`] writes the archive.
//! [`catalog`] lists the store, [`extract`] unpacks one archive and
//! [`cleaner`] empties the store.

pub mod builder;
pub mod catalog;
pub mod cleaner;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod events;
pub mod extract;
pub mod pack;
pub mod rules;
pub mod selection;

// Re-exports
pub use builder::{archive_file_name, ArchiveBuilder, Manifest, SkipRecord};
pub use catalog::{ArchiveCatalog, ArchiveInfo, CatalogListing};
pub use cleaner::{delete_archives, CleanupReport, DeletionFailure};
pub use config::{PackOptions, StoreConfig};
pub use enumerate::{enumerate, CatalogItem, ItemKind};
pub use error::{Result, SyncfError};
pub use events::{Event, EventSink, NullSink};
pub use extract::{extract, ExtractOutcome};
pub use pack::pack;
pub use rules::{Matcher, RuleSet};
pub use selection::{select, Selection};
