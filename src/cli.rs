//! Command-line interface for syncf

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use syncf_core::config::STORE_DIR_ENV;

#[derive(Parser)]
#[command(name = "syncf", version)]
#[command(about = "syncf - pack files selected by rule lists into tar.gz archives", long_about = None)]
pub struct Cli {
    /// Display the details of actions
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Archive store directory (defaults to <install root>/.files)
    #[arg(long, global = true, env = STORE_DIR_ENV)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package the files matched by a rule list
    #[command(visible_alias = "z")]
    Pack {
        /// Rule file: gitignore-style patterns, `!` prefix excludes
        rules: PathBuf,

        /// Archive base name (timestamp and .tar.gz are appended)
        name: String,

        /// Gzip compression level (0-9, higher = smaller, slower)
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: u32,
    },

    /// Unpack an archive into the current directory
    #[command(visible_alias = "u")]
    Unpack {
        /// Archive file name or its number in `syncf list` (asks when omitted)
        archive: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Display the list of archives
    #[command(visible_alias = "l")]
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every archive in the store
    #[command(visible_alias = "c")]
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pack_alias_and_level() {
        let cli = Cli::try_parse_from(["syncf", "z", "filelist", "proj", "--level", "9", "-v"])
            .expect("valid arguments");
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Pack { rules, name, level }) => {
                assert_eq!(rules, PathBuf::from("filelist"));
                assert_eq!(name, "proj");
                assert_eq!(level, 9);
            }
            _ => panic!("expected pack"),
        }
    }

    #[test]
    fn level_out_of_range() {
        assert!(Cli::try_parse_from(["syncf", "pack", "filelist", "proj", "--level", "12"]).is_err());
    }

    #[test]
    fn unpack_by_index() {
        let cli = Cli::try_parse_from(["syncf", "unpack", "2", "--yes"]).expect("valid arguments");
        match cli.command {
            Some(Commands::Unpack { archive, yes }) => {
                assert_eq!(archive.as_deref(), Some("2"));
                assert!(yes);
            }
            _ => panic!("expected unpack"),
        }
    }
}
