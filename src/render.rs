//! Terminal output: progress bars driven by core events and the summaries
//! printed after each command.

use chrono::{DateTime, Datelike, Local};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::Path;
use syncf_core::{ArchiveInfo, CatalogListing, CleanupReport, Event, EventSink, Manifest};

/// Number of skipped items listed before the rest are summarised.
const SKIP_PREVIEW: usize = 5;

/// Event sink for the CLI. Milestones are always printed; per-item lines
/// and progress bars only in verbose mode.
pub struct Reporter {
    verbose: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: RefCell::new(None),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }

    fn start_bar(&self, len: Option<u64>) {
        if !self.verbose {
            return;
        }
        let bar = match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
                );
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        if let Some(old) = self.bar.replace(Some(bar)) {
            old.finish_and_clear();
        }
    }

    fn line(&self, msg: String) {
        if !self.verbose {
            return;
        }
        match self.bar.borrow().as_ref() {
            Some(bar) => bar.println(msg),
            None => println!("{}", msg),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            f(bar);
        }
    }
}

impl EventSink for Reporter {
    fn emit(&self, event: &Event<'_>) {
        match event {
            Event::StoreCreated { path } => {
                println!("Created store directory {}", path.display());
            }
            Event::PackStarted { archive, total } => {
                println!("Packing {} items into {}", total, archive.display());
                self.start_bar(Some(*total as u64));
            }
            Event::ItemAdded { path, size } => {
                self.line(format!("  Added: {} ({})", path, HumanBytes(*size)));
            }
            Event::DirectoryAdded { path } => {
                self.line(format!("  Added directory: {}", path));
            }
            Event::ItemSkipped { record } => {
                self.line(format!("  Skipped: {} - {}", record.path, record.reason));
            }
            Event::Progress { done, .. } => {
                self.with_bar(|bar| bar.set_position(*done as u64));
            }
            Event::PackFinished { .. } => self.finish(),
            Event::UnpackStarted { archive } => {
                println!("Unpacking {}", archive.display());
                self.start_bar(None);
            }
            Event::EntryUnpacked { path, is_dir } => {
                if *is_dir {
                    self.line(format!("  Created directory: {}", path));
                } else {
                    self.line(format!("  Unpacked: {}", path));
                }
                self.with_bar(|bar| bar.inc(1));
            }
            Event::CleanStarted { count, total_bytes } => {
                println!("Found {} archives ({})", count, HumanBytes(*total_bytes));
                self.start_bar(Some(*count as u64));
            }
            Event::ArchiveDeleted { name, size } => {
                self.line(format!("  Deleted: {} ({})", name, HumanBytes(*size)));
                self.with_bar(|bar| bar.inc(1));
            }
            Event::DeletionFailed { failure } => {
                eprintln!("  Failed to delete {}: {}", failure.path.display(), failure.reason);
                self.with_bar(|bar| bar.inc(1));
            }
        }
    }
}

pub fn print_manifest(manifest: &Manifest) {
    println!();
    println!("✓ Package complete: {}", manifest.archive_path.display());
    println!(
        "  Packed {} files and {} directories, {}",
        manifest.files_added,
        manifest.directories_added,
        HumanBytes(manifest.bytes_added)
    );

    if !manifest.skipped.is_empty() {
        println!("  Skipped {} items:", manifest.skipped.len());
        for record in manifest.skipped.iter().take(SKIP_PREVIEW) {
            println!("    {} - {}", record.path, record.reason);
        }
        if manifest.skipped.len() > SKIP_PREVIEW {
            println!("    ... and {} more", manifest.skipped.len() - SKIP_PREVIEW);
        }
    }
}

pub fn print_listing(listing: &CatalogListing, store_dir: &Path) {
    match listing {
        CatalogListing::StoreCreated => {
            println!("Created store directory {}", store_dir.display());
            println!("No archives yet");
        }
        CatalogListing::Empty => println!("No archives in {}", store_dir.display()),
        CatalogListing::Archives(archives) => {
            let now = Local::now();
            for (idx, archive) in archives.iter().enumerate() {
                println!("{}", archive_line(idx + 1, archive, now));
            }
        }
    }
}

/// Archives, most recent first, as pretty-printed JSON.
pub fn listing_json(listing: &CatalogListing) -> serde_json::Result<String> {
    serde_json::to_string_pretty(listing.archives())
}

pub fn print_cleanup(report: &CleanupReport) {
    if !report.store_found {
        println!("No store directory, nothing to clean");
        return;
    }
    if report.deleted.is_empty() && report.failures.is_empty() {
        println!("No archives to clean");
        return;
    }

    println!(
        "✓ Deleted {} archives, freed {}",
        report.deleted_count(),
        HumanBytes(report.freed_bytes)
    );
    if !report.failures.is_empty() {
        println!("  {} archives could not be deleted", report.failures.len());
    }
}

fn archive_line(index: usize, archive: &ArchiveInfo, now: DateTime<Local>) -> String {
    format!(
        "{:>3}. {}  {:>10}  {}",
        index,
        archive.name,
        HumanBytes(archive.size).to_string(),
        format_modified(archive.modified, now)
    )
}

/// Relative day for recent archives, full date otherwise.
pub fn format_modified(when: DateTime<Local>, now: DateTime<Local>) -> String {
    let day = when.date_naive();
    let today = now.date_naive();

    if day == today {
        when.format("today %H:%M").to_string()
    } else if Some(day) == today.pred_opt() {
        when.format("yesterday %H:%M").to_string()
    } else if day.year() == today.year() {
        when.format("%m-%d %H:%M").to_string()
    } else {
        when.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn relative_days() {
        let now = at(2026, 3, 10, 18, 0);
        assert_eq!(format_modified(at(2026, 3, 10, 9, 5), now), "today 09:05");
        assert_eq!(format_modified(at(2026, 3, 9, 23, 59), now), "yesterday 23:59");
        assert_eq!(format_modified(at(2026, 1, 2, 7, 30), now), "01-02 07:30");
        assert_eq!(format_modified(at(2025, 12, 31, 7, 30), now), "2025-12-31");
    }

    #[test]
    fn listing_line_has_index_and_size() {
        let archive = ArchiveInfo {
            name: "proj_20260310_090500.tar.gz".to_string(),
            path: PathBuf::from("/store/proj_20260310_090500.tar.gz"),
            size: 2048,
            modified: at(2026, 3, 10, 9, 5),
        };
        let line = archive_line(2, &archive, at(2026, 3, 10, 18, 0));
        assert!(line.starts_with("  2. proj_20260310_090500.tar.gz"));
        assert!(line.contains("2.00 KiB"));
        assert!(line.ends_with("today 09:05"));
    }

    #[test]
    fn listing_serialises_archive_fields() -> anyhow::Result<()> {
        let listing = CatalogListing::Archives(vec![ArchiveInfo {
            name: "proj_20260310_090500.tar.gz".to_string(),
            path: PathBuf::from("/store/proj_20260310_090500.tar.gz"),
            size: 2048,
            modified: at(2026, 3, 10, 9, 5),
        }]);
        let value: serde_json::Value = serde_json::from_str(&listing_json(&listing)?)?;
        assert_eq!(value[0]["name"], "proj_20260310_090500.tar.gz");
        assert_eq!(value[0]["size"], 2048);
        let modified = value[0]["modified"].as_str().expect("timestamp string");
        assert!(modified.starts_with("2026-03-10T09:05:00"));

        assert_eq!(listing_json(&CatalogListing::Empty)?, "[]");
        Ok(())
    }
}
