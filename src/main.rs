//! syncf - pack files selected by rule lists into timestamped archives

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use syncf_core::{
    delete_archives, extract, pack, ArchiveCatalog, ExtractOutcome, PackOptions, StoreConfig,
    SyncfError,
};
use tracing_subscriber::EnvFilter;

mod cli;
mod prompt;
mod render;

use cli::{Cli, Commands};
use render::Reporter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        print_banner();
        Cli::command().print_help()?;
        return Ok(());
    };
    let store = StoreConfig::resolve(cli.store_dir);
    let verbose = cli.verbose;

    match command {
        Commands::Pack { rules, name, level } => {
            let root = working_dir()?;
            let options = PackOptions {
                verbose,
                compression_level: level,
            };
            let reporter = Reporter::new(verbose);

            match pack(&rules, &root, &name, store, options, &reporter) {
                Ok(manifest) => {
                    render::print_manifest(&manifest);
                    Ok(())
                }
                Err(SyncfError::NoMatchingFiles) => {
                    reporter.finish();
                    println!("Warning: no files matched the rules in {}", rules.display());
                    Ok(())
                }
                Err(e) => {
                    reporter.finish();
                    Err(e).context("Packing failed")
                }
            }
        }

        Commands::Unpack { archive, yes } => {
            let catalog = ArchiveCatalog::new(store);
            let chosen = match archive {
                Some(selector) => catalog.find(&selector)?,
                None => {
                    let listing = catalog.list()?;
                    render::print_listing(&listing, catalog.store_dir());
                    if listing.is_empty() {
                        return Ok(());
                    }
                    match prompt::choose_archive(listing.archives())? {
                        Some(info) => info.clone(),
                        None => {
                            println!("No archive selected");
                            return Ok(());
                        }
                    }
                }
            };

            let dest = working_dir()?;
            println!("Selected {}", chosen.name);
            let confirmed = yes
                || prompt::confirm(&format!("Unpack into {}?", dest.display()), true)?;

            let reporter = Reporter::new(verbose);
            let outcome = extract(&chosen.path, &dest, confirmed, &reporter);
            reporter.finish();
            match outcome.context("Unpacking failed")? {
                ExtractOutcome::Cancelled => println!("Unpack cancelled"),
                ExtractOutcome::Extracted { files, directories } => println!(
                    "✓ Unpacked {} files and {} directories from {}",
                    files, directories, chosen.name
                ),
            }
            Ok(())
        }

        Commands::List { json } => {
            let catalog = ArchiveCatalog::new(store);
            let listing = catalog.list()?;
            if json {
                println!("{}", render::listing_json(&listing)?);
            } else {
                render::print_listing(&listing, catalog.store_dir());
            }
            Ok(())
        }

        Commands::Clean => {
            let reporter = Reporter::new(verbose);
            let report = delete_archives(&store, &reporter);
            reporter.finish();
            render::print_cleanup(&report.context("Cleaning failed")?);
            Ok(())
        }
    }
}

/// Log records from the core go through the `log` facade and are forwarded
/// to this subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to resolve the current directory")
}

fn print_banner() {
    println!("syncf {}", env!("CARGO_PKG_VERSION"));
    println!("Pack files picked by a rule list, list and unpack archives, clean the store.");
    println!();
}
