//! Rule file compilation.
//!
//! A rule file holds one gitignore-style pattern per line. Lines starting with
//! `!` are exclusions; every other non-blank, non-comment line is an
//! inclusion. The two groups are compiled into independent matchers, so the
//! position of an exclusion relative to an inclusion does not matter.

use crate::error::{Result, SyncfError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub polarity: Polarity,
}

impl Rule {
    /// Parse one raw line. Returns `None` for blank lines and comments.
    pub fn parse(line: &str) -> Option<Rule> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }

        match line.strip_prefix('!') {
            Some(rest) => Some(Rule {
                pattern: rest.to_string(),
                polarity: Polarity::Exclude,
            }),
            None => Some(Rule {
                pattern: line.to_string(),
                polarity: Polarity::Include,
            }),
        }
    }
}

/// A compiled group of gitignore wildcard patterns.
///
/// A pattern that matches a directory also matches everything below it, so
/// `src/` covers both `src/` and `src/a.py`.
#[derive(Clone, Debug)]
pub struct Matcher {
    patterns: Vec<String>,
    globs: Gitignore,
}

impl Matcher {
    pub fn compile(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(".");
        for pattern in &patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| SyncfError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
        }
        let globs = builder.build().map_err(|e| SyncfError::InvalidPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self { patterns, globs })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a catalog path. A trailing `/` marks a directory.
    pub fn is_match(&self, item: &str) -> bool {
        let (path, is_dir) = match item.strip_suffix('/') {
            Some(dir) => (dir, true),
            None => (item, false),
        };
        let path = Path::new(path);
        if path.as_os_str().is_empty() || path.has_root() {
            return false;
        }
        self.globs
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}

#[derive(Clone, Debug)]
pub struct RuleSet {
    include: Matcher,
    exclude: Option<Matcher>,
}

impl RuleSet {
    /// Compile raw rule-file lines.
    ///
    /// Fails with [`SyncfError::EmptyIncludeRules`] when no include pattern
    /// remains, whatever the exclusions say.
    pub fn compile<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for rule in lines.into_iter().filter_map(|l| Rule::parse(l.as_ref())) {
            match rule.polarity {
                Polarity::Include => include.push(rule.pattern),
                Polarity::Exclude => exclude.push(rule.pattern),
            }
        }

        if include.is_empty() {
            return Err(SyncfError::EmptyIncludeRules);
        }

        log::debug!(
            "compiled rule set: {} include, {} exclude",
            include.len(),
            exclude.len()
        );

        let include = Matcher::compile(include)?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(Matcher::compile(exclude)?)
        };

        Ok(Self { include, exclude })
    }

    /// Read and compile a UTF-8 rule file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SyncfError::RuleFileMissing(path.to_path_buf()),
            _ => SyncfError::RuleFileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::compile(text.lines())
    }

    pub fn include(&self) -> &Matcher {
        &self.include
    }

    pub fn exclude(&self) -> Option<&Matcher> {
        self.exclude.as_ref()
    }

    /// `include(item) && !(exclude exists && exclude(item))`
    pub fn is_selected(&self, item: &str) -> bool {
        if !self.include.is_match(item) {
            return false;
        }
        !self.exclude.as_ref().is_some_and(|ex| ex.is_match(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_and_comment_lines() {
        assert_eq!(Rule::parse(""), None);
        assert_eq!(Rule::parse("   \r\n"), None);
        assert_eq!(Rule::parse("# build output"), None);
        assert_eq!(
            Rule::parse("!*.log\r\n"),
            Some(Rule {
                pattern: "*.log".to_string(),
                polarity: Polarity::Exclude,
            })
        );
        assert_eq!(
            Rule::parse("src/\n").map(|r| r.polarity),
            Some(Polarity::Include)
        );
    }

    #[test]
    fn only_exclusions_is_rejected() {
        let err = RuleSet::compile(["!*.log", "# comment", ""]).unwrap_err();
        assert!(matches!(err, SyncfError::EmptyIncludeRules));

        let err = RuleSet::compile(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, SyncfError::EmptyIncludeRules));
    }

    #[test]
    fn include_minus_exclude() -> anyhow::Result<()> {
        let rules = RuleSet::compile(["*.py", "!test_*.py"])?;
        assert!(rules.is_selected("a.py"));
        assert!(rules.is_selected("pkg/a.py"));
        assert!(!rules.is_selected("test_a.py"));
        assert!(!rules.is_selected("pkg/test_a.py"));
        assert!(!rules.is_selected("b.txt"));
        Ok(())
    }

    #[test]
    fn exclude_position_does_not_matter() -> anyhow::Result<()> {
        let after = RuleSet::compile(["*.py", "!test_*.py"])?;
        let before = RuleSet::compile(["!test_*.py", "*.py"])?;
        for item in ["a.py", "test_a.py", "b.txt", "src/", "src/test_b.py"] {
            assert_eq!(after.is_selected(item), before.is_selected(item), "{item}");
        }
        Ok(())
    }

    #[test]
    fn directory_rule_covers_descendants() -> anyhow::Result<()> {
        let rules = RuleSet::compile(["src/"])?;
        assert!(rules.is_selected("src/"));
        assert!(rules.is_selected("src/a.py"));
        assert!(rules.is_selected("src/utils/"));
        assert!(rules.is_selected("src/utils/helpers.py"));
        assert!(rules.is_selected("lib/src/"));
        // A plain file named like the directory rule is not a directory.
        assert!(!rules.is_selected("src"));
        assert!(!rules.is_selected("docs/index.md"));
        Ok(())
    }

    #[test]
    fn double_star_crosses_segments() -> anyhow::Result<()> {
        let rules = RuleSet::compile(["data/**/*.csv"])?;
        assert!(rules.is_selected("data/raw/dataset1.csv"));
        assert!(rules.is_selected("data/a/b/c.csv"));
        assert!(!rules.is_selected("other/raw/dataset1.csv"));
        Ok(())
    }

    #[test]
    fn single_star_stays_in_segment() -> anyhow::Result<()> {
        let rules = RuleSet::compile(["/docs/*.md"])?;
        assert!(rules.is_selected("docs/index.md"));
        assert!(!rules.is_selected("docs/sub/index.md"));
        Ok(())
    }

    #[test]
    fn excluded_directory_hides_its_files() -> anyhow::Result<()> {
        let rules = RuleSet::compile(["*", "!__pycache__/"])?;
        assert!(rules.is_selected("main.py"));
        assert!(!rules.is_selected("__pycache__/"));
        assert!(!rules.is_selected("__pycache__/module.pyc"));
        Ok(())
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = RuleSet::compile(["src/[abc"]).unwrap_err();
        match err {
            SyncfError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "src/[abc"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_rule_file() {
        let err = RuleSet::from_file(Path::new("/nonexistent/syncf/rules.txt")).unwrap_err();
        assert!(matches!(err, SyncfError::RuleFileMissing(_)));
    }

    #[test]
    fn rule_file_with_crlf() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("rules.txt");
        fs::write(&path, "# keep sources\r\n*.rs\r\n\r\n!target/\r\n")?;

        let rules = RuleSet::from_file(&path)?;
        assert_eq!(rules.include().patterns(), ["*.rs"]);
        assert_eq!(
            rules.exclude().map(|m| m.patterns().to_vec()),
            Some(vec!["target/".to_string()])
        );
        assert!(rules.is_selected("src/main.rs"));
        assert!(!rules.is_selected("target/debug/build.rs"));
        Ok(())
    }
}
