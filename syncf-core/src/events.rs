//! Structured progress events.
//!
//! The core never prints. Builder, extractor and cleaner report what they do
//! through an [`EventSink`] supplied by the caller; the CLI turns these into
//! progress bars and summaries.

use crate::builder::{Manifest, SkipRecord};
use crate::cleaner::DeletionFailure;
use std::path::Path;

#[derive(Debug)]
pub enum Event<'a> {
    /// The store directory did not exist and was created.
    StoreCreated { path: &'a Path },
    PackStarted { archive: &'a Path, total: usize },
    /// Emitted for verbose builds only.
    ItemAdded { path: &'a str, size: u64 },
    /// Emitted for verbose builds only.
    DirectoryAdded { path: &'a str },
    ItemSkipped { record: &'a SkipRecord },
    /// One selected item has been handled, whatever the outcome.
    Progress { done: usize, total: usize },
    PackFinished { manifest: &'a Manifest },
    UnpackStarted { archive: &'a Path },
    EntryUnpacked { path: &'a str, is_dir: bool },
    CleanStarted { count: usize, total_bytes: u64 },
    ArchiveDeleted { name: &'a str, size: u64 },
    DeletionFailed { failure: &'a DeletionFailure },
}

pub trait EventSink {
    fn emit(&self, event: &Event<'_>);
}

impl<F> EventSink for F
where
    F: Fn(&Event<'_>),
{
    fn emit(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event<'_>) {}
}
