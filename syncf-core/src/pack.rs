use crate::builder::{ArchiveBuilder, Manifest};
use crate::config::{PackOptions, StoreConfig};
use crate::enumerate::enumerate;
use crate::error::Result;
use crate::events::EventSink;
use crate::rules::RuleSet;
use crate::selection::select;
use std::path::Path;

/// Read `rule_file`, select matching items under `root` and archive them as
/// `<name>_<timestamp>.tar.gz` in the store.
pub fn pack(
    rule_file: &Path,
    root: &Path,
    name: &str,
    store: StoreConfig,
    options: PackOptions,
    sink: &dyn EventSink,
) -> Result<Manifest> {
    let rules = RuleSet::from_file(rule_file)?;
    let items = enumerate(root)?;
    let selection = select(&rules, &items)?;
    ArchiveBuilder::new(root, store, options).build(&selection, name, sink)
}
