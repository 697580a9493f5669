use crate::enumerate::CatalogItem;
use crate::error::{Result, SyncfError};
use crate::rules::RuleSet;

/// Ordered items chosen for archiving. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    items: Vec<CatalogItem>,
}

impl Selection {
    /// Build a selection from POSIX paths chosen elsewhere. A trailing `/`
    /// marks a directory.
    pub fn from_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_items(paths.into_iter().map(CatalogItem::from_posix).collect())
    }

    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(SyncfError::NoMatchingFiles);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn paths(&self) -> Vec<&str> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.path.as_str())
    }
}

/// Keep the items the rule set selects, in enumeration order.
pub fn select(rules: &RuleSet, items: &[CatalogItem]) -> Result<Selection> {
    let chosen: Vec<CatalogItem> = items
        .iter()
        .filter(|item| rules.is_selected(&item.path))
        .cloned()
        .collect();

    log::debug!("selected {} of {} items", chosen.len(), items.len());
    Selection::from_items(chosen)
}
