//! CLI argument definitions using clap
//!
//! Commands:
//! - enrollcheck check --students <path> --courses <path> --requests <path>
//!   [--check <name>] [--config <path>]
//! - enrollcheck schema

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::query::CheckKind;

/// enrollcheck - cross-table validation of student enrollment data
#[derive(Parser, Debug)]
#[command(name = "enrollcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the three datasets and run validation checks
    Check {
        /// Students JSON file (array of row objects)
        #[arg(long)]
        students: PathBuf,

        /// Courses JSON file (array of row objects)
        #[arg(long)]
        courses: PathBuf,

        /// Course requests JSON file (array of row objects)
        #[arg(long)]
        requests: PathBuf,

        /// Check to run
        #[arg(long, value_enum, default_value_t = CheckArg::All)]
        check: CheckArg,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the collection schemas
    Schema,
}

/// `--check` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckArg {
    Grades,
    Credits,
    Subjects,
    Advisory,
    Ap,
    All,
}

impl CheckArg {
    /// The selected check, or `None` for all of them
    pub fn kind(self) -> Option<CheckKind> {
        match self {
            CheckArg::Grades => Some(CheckKind::Grades),
            CheckArg::Credits => Some(CheckKind::Credits),
            CheckArg::Subjects => Some(CheckKind::Subjects),
            CheckArg::Advisory => Some(CheckKind::Advisory),
            CheckArg::Ap => Some(CheckKind::Ap),
            CheckArg::All => None,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_defaults_to_all() {
        let cli = Cli::try_parse_from([
            "enrollcheck",
            "check",
            "--students",
            "s.json",
            "--courses",
            "c.json",
            "--requests",
            "r.json",
        ])
        .unwrap();

        match cli.command {
            Command::Check { check, config, .. } => {
                assert_eq!(check, CheckArg::All);
                assert!(config.is_none());
            }
            Command::Schema => panic!("expected check"),
        }
    }

    #[test]
    fn test_single_check_selection() {
        let cli = Cli::try_parse_from([
            "enrollcheck", "check", "--students", "s", "--courses", "c", "--requests", "r",
            "--check", "ap",
        ])
        .unwrap();

        let Command::Check { check, .. } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(check.kind(), Some(CheckKind::Ap));
    }

    #[test]
    fn test_missing_dataset_rejected() {
        assert!(Cli::try_parse_from(["enrollcheck", "check", "--students", "s"]).is_err());
    }
}
