use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use syncf_core::{
    delete_archives, enumerate, extract, pack, select, ArchiveBuilder, ArchiveCatalog,
    CatalogListing, ExtractOutcome, NullSink, PackOptions, RuleSet, Selection, StoreConfig,
    SyncfError,
};
use tempfile::TempDir;

const TREE: &[(&str, &str)] = &[
    ("main.py", "print('main')\n"),
    ("config.yaml", "database:\n  host: localhost\n"),
    ("README.md", "# Test Project\n"),
    ("src/__init__.py", ""),
    ("src/module1.py", "def one():\n    return 1\n"),
    ("src/utils/helpers.py", "def help():\n    pass\n"),
    ("src/tests/test_basic.py", "def test_ok():\n    assert True\n"),
    ("docs/index.md", "# Docs\n"),
    ("logs/app.log", "started\n"),
    ("build/compiled.so", "\u{7f}ELF"),
];

fn make_tree(root: &Path) -> Result<()> {
    for (rel, content) in TREE {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 1, 1, 16, 5, 31)
        .single()
        .expect("unambiguous local time")
}

fn archive_entries(path: &Path) -> Result<BTreeSet<String>> {
    let dest = TempDir::new()?;
    extract(path, dest.path(), true, &NullSink)?;
    Ok(enumerate(dest.path())?.into_iter().map(|i| i.path).collect())
}

#[test]
fn pack_then_extract_reproduces_selected_files() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let rules_dir = TempDir::new()?;
    let rules = rules_dir.path().join("filelist");
    fs::write(&rules, "# sources only\n*.py\n!test_*.py\nREADME.md\n")?;
    let store = StoreConfig::new(work.path().join(".files"));

    let manifest = pack(&rules, work.path(), "proj", store.clone(), PackOptions::default(), &NullSink)?;
    assert_eq!(manifest.files_added, 5);
    assert!(manifest.skipped.is_empty());
    let expected_bytes: u64 = ["main.py", "README.md", "src/__init__.py", "src/module1.py", "src/utils/helpers.py"]
        .iter()
        .map(|p| fs::metadata(work.path().join(p)).map(|m| m.len()))
        .sum::<std::io::Result<u64>>()?;
    assert_eq!(manifest.bytes_added, expected_bytes);

    let dest = TempDir::new()?;
    let outcome = extract(&manifest.archive_path, dest.path(), true, &NullSink)?;
    assert_eq!(outcome, ExtractOutcome::Extracted { files: 5, directories: 0 });

    for rel in ["main.py", "README.md", "src/__init__.py", "src/module1.py", "src/utils/helpers.py"] {
        assert_eq!(fs::read(dest.path().join(rel))?, fs::read(work.path().join(rel))?, "{rel}");
    }
    assert!(!dest.path().join("src/tests/test_basic.py").exists());
    assert!(!dest.path().join("config.yaml").exists());
    Ok(())
}

#[test]
fn skipped_items_are_absent_after_extraction() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let store = StoreConfig::new(work.path().join(".files"));

    let selection = Selection::from_paths(["main.py", "vanished.txt", "docs/", "docs/index.md"])?;
    let manifest = ArchiveBuilder::new(work.path(), store, PackOptions::default())
        .build_at(&selection, "partial", fixed_time(), &NullSink)?;

    assert_eq!(manifest.files_added, 2);
    assert_eq!(manifest.directories_added, 1);
    assert_eq!(manifest.skipped.len(), 1);
    assert_eq!(manifest.skipped[0].path, "vanished.txt");
    assert_eq!(manifest.skipped[0].reason, "File not found");

    let entries = archive_entries(&manifest.archive_path)?;
    let expected: BTreeSet<String> = ["main.py", "docs/", "docs/index.md"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(entries, expected);
    Ok(())
}

#[test]
fn exclusion_order_does_not_change_selection() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let items = enumerate(work.path())?;

    let include_first = RuleSet::compile(["*.py", "!test_*.py"])?;
    let exclude_first = RuleSet::compile(["!test_*.py", "*.py"])?;
    assert_eq!(select(&include_first, &items)?, select(&exclude_first, &items)?);

    let selection = select(&include_first, &items)?;
    for item in &items {
        let expected = include_first.include().is_match(&item.path)
            && !include_first
                .exclude()
                .is_some_and(|ex| ex.is_match(&item.path));
        assert_eq!(selection.paths().contains(&item.path.as_str()), expected, "{}", item.path);
    }
    Ok(())
}

#[test]
fn directory_rule_selects_directory_and_descendants() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let rules = RuleSet::compile(["src/"])?;
    let selection = select(&rules, &enumerate(work.path())?)?;

    let selected: BTreeSet<&str> = selection.iter().collect();
    let expected: BTreeSet<&str> = [
        "src/",
        "src/__init__.py",
        "src/module1.py",
        "src/tests/",
        "src/tests/test_basic.py",
        "src/utils/",
        "src/utils/helpers.py",
    ]
    .into_iter()
    .collect();
    assert_eq!(selected, expected);
    Ok(())
}

#[test]
fn same_name_same_second_overwrites() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let store = StoreConfig::new(work.path().join(".files"));
    let builder = ArchiveBuilder::new(work.path(), store.clone(), PackOptions::default());

    let first = builder.build_at(&Selection::from_paths(["main.py"])?, "proj", fixed_time(), &NullSink)?;
    let second = builder.build_at(
        &Selection::from_paths(["README.md", "docs/index.md"])?,
        "proj",
        fixed_time(),
        &NullSink,
    )?;

    assert_eq!(first.archive_path, second.archive_path);
    assert_eq!(second.files_added, 2);

    let listing = ArchiveCatalog::new(store).list()?;
    let matching: Vec<_> = listing
        .archives()
        .iter()
        .filter(|a| a.name == "proj_20260101_160531.tar.gz")
        .collect();
    assert_eq!(matching.len(), 1);

    let entries = archive_entries(&second.archive_path)?;
    assert!(entries.contains("README.md"));
    assert!(entries.contains("docs/index.md"));
    assert!(!entries.contains("main.py"));
    Ok(())
}

#[test]
fn listing_is_stable() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let store = StoreConfig::new(work.path().join(".files"));
    let builder = ArchiveBuilder::new(work.path(), store.clone(), PackOptions::default());
    let selection = Selection::from_paths(["main.py"])?;
    builder.build_at(&selection, "a", fixed_time(), &NullSink)?;
    builder.build_at(&selection, "b", fixed_time(), &NullSink)?;

    let catalog = ArchiveCatalog::new(store);
    let first = catalog.list()?;
    let second = catalog.list()?;
    assert_eq!(first, second);
    assert_eq!(first.archives().len(), 2);
    Ok(())
}

#[test]
fn cleaning_empty_store_succeeds() -> Result<()> {
    let work = TempDir::new()?;
    let store = StoreConfig::new(work.path().join(".files"));
    assert_eq!(ArchiveCatalog::new(store.clone()).list()?, CatalogListing::StoreCreated);

    let report = delete_archives(&store, &NullSink)?;
    assert_eq!(report.deleted_count(), 0);
    assert!(report.failures.is_empty());
    Ok(())
}

#[test]
fn clean_removes_built_archives() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let store = StoreConfig::new(work.path().join(".files"));
    let builder = ArchiveBuilder::new(work.path(), store.clone(), PackOptions::default());
    let selection = Selection::from_paths(["main.py"])?;
    builder.build_at(&selection, "one", fixed_time(), &NullSink)?;
    builder.build_at(&selection, "two", fixed_time(), &NullSink)?;

    let report = delete_archives(&store, &NullSink)?;
    assert_eq!(report.deleted_count(), 2);
    assert_eq!(ArchiveCatalog::new(store).list()?, CatalogListing::Empty);
    Ok(())
}

#[test]
fn exclusions_only_select_nothing() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let rules = work.path().join("filelist");
    fs::write(&rules, "!*.log\n!build/\n")?;

    let err = pack(
        &rules,
        work.path(),
        "none",
        StoreConfig::new(work.path().join(".files")),
        PackOptions::default(),
        &NullSink,
    )
    .unwrap_err();
    assert!(matches!(err, SyncfError::EmptyIncludeRules));
    assert!(!work.path().join(".files").exists());
    Ok(())
}

#[test]
fn no_match_and_missing_rule_file() -> Result<()> {
    let work = TempDir::new()?;
    make_tree(work.path())?;
    let store = StoreConfig::new(work.path().join(".files"));

    let rules = work.path().join("filelist");
    fs::write(&rules, "*.rs\n")?;
    let err = pack(&rules, work.path(), "x", store.clone(), PackOptions::default(), &NullSink).unwrap_err();
    assert!(matches!(err, SyncfError::NoMatchingFiles));

    let missing = work.path().join("no-such-filelist");
    let err = pack(&missing, work.path(), "x", store, PackOptions::default(), &NullSink).unwrap_err();
    assert!(matches!(err, SyncfError::RuleFileMissing(_)));
    Ok(())
}
