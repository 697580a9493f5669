//! Interactive questions on stdin.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use syncf_core::ArchiveInfo;

/// What the user typed in answer to the archive menu.
#[derive(Debug, PartialEq, Eq)]
pub enum Choice {
    Archive(usize),
    Quit,
    Invalid(String),
}

/// Ask for an archive by number or name. Empty input, `q` or `exit` quits.
pub fn choose_archive(archives: &[ArchiveInfo]) -> Result<Option<&ArchiveInfo>> {
    let answer = ask(&format!(
        "Select an archive (1-{}, or name; empty to quit): ",
        archives.len()
    ))?;
    match parse_choice(&answer, archives) {
        Choice::Archive(idx) => Ok(archives.get(idx)),
        Choice::Quit => Ok(None),
        Choice::Invalid(input) => {
            println!("No archive matches '{}'", input);
            Ok(None)
        }
    }
}

/// Yes/no question; an empty answer takes `default`.
pub fn confirm(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = ask(&format!("{} {} ", question, hint))?;
    Ok(parse_yes_no(&answer).unwrap_or(default))
}

fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read answer from stdin")?;
    Ok(line.trim().to_string())
}

fn parse_choice(answer: &str, archives: &[ArchiveInfo]) -> Choice {
    match answer {
        "" | "q" | "exit" => return Choice::Quit,
        _ => {}
    }
    if let Some(idx) = archives.iter().position(|a| a.name == answer) {
        return Choice::Archive(idx);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=archives.len()).contains(&n) => Choice::Archive(n - 1),
        _ => Choice::Invalid(answer.to_string()),
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
