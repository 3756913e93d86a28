pub mod accounts;
pub mod browse;
pub mod import;
pub mod init;
pub mod preview;
pub mod records;
pub mod status;
pub mod tasks;
pub mod toggle;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::db::SqliteBridge;
use crate::error::Result;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "cajero", about = "Review, account for and import bank-account movements.")]
pub struct Cli {
    /// Database file (default: <data_dir>/cajero.db)
    #[arg(long, global = true, env = "CAJERO_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the database.
    Init {
        /// Path for cajero data (default: ~/Documents/cajero)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// List accounts with movement counts and last balance.
    Accounts,
    /// Print one page of an account's movements.
    Records {
        /// Account (caja) name
        caja: String,
        /// Tab: all, contabilized or not_contabilized
        #[arg(long, default_value = "all")]
        tab: String,
        /// Case-insensitive search term
        #[arg(long)]
        search: Option<String>,
        /// Field to search: all, concepto, fecha, importe, saldo, caja, ...
        #[arg(long, default_value = "all")]
        field: String,
        /// Page number (clamped to the available pages)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Page size (default from settings)
        #[arg(long)]
        page_size: Option<usize>,
        /// Write every filtered movement as CSV instead of a page
        #[arg(long)]
        csv: bool,
    },
    /// Interactively browse movements.
    Browse {
        /// Account to open first
        caja: Option<String>,
    },
    /// Flip the accounted state of a movement.
    Toggle {
        caja: String,
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Preview parsed statement records before importing them.
    Preview {
        /// JSON array of parsed records
        file: PathBuf,
        /// Override the account of every record
        #[arg(long)]
        caja: Option<String>,
    },
    /// Import the new records of a parsed statement.
    Import {
        /// JSON array of parsed records
        file: PathBuf,
        #[arg(long)]
        caja: Option<String>,
        /// Import even when balances are inconsistent
        #[arg(long)]
        force: bool,
        /// Leave a new movement out of the import (repeatable)
        #[arg(long = "skip", value_name = "ID")]
        skip: Vec<String>,
    },
    /// Manage accounting tasks of a movement.
    Tasks {
        #[command(subcommand)]
        command: TasksCommands,
    },
    /// Show database location and totals.
    Status,
}

#[derive(Subcommand)]
pub enum TasksCommands {
    /// Show the task cards of a movement.
    List { movement_id: String },
    /// Attach tasks from a JSON file (one task or an array).
    Add { movement_id: String, file: PathBuf },
    /// Remove every task of a movement.
    Delete { movement_id: String },
}

/// Resolved settings plus the database override.
pub struct Context {
    pub settings: Settings,
    pub db_path: PathBuf,
}

impl Context {
    pub fn new(db: Option<PathBuf>) -> Self {
        let settings = load_settings();
        let db_path = db.unwrap_or_else(|| settings.db_path());
        Self { settings, db_path }
    }

    pub fn open_bridge(&self) -> Result<SqliteBridge> {
        if let Some(dir) = self.db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        log::debug!("opening {}", self.db_path.display());
        SqliteBridge::open(&self.db_path, self.settings.recent_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_records_options() {
        let cli = Cli::try_parse_from([
            "cajero", "--db", "/tmp/x.db", "records", "200_BANCO", "--tab", "contabilized", "--page", "2",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        let Commands::Records { caja, tab, page, csv, .. } = cli.command else {
            panic!("expected records");
        };
        assert_eq!(caja, "200_BANCO");
        assert_eq!(tab, "contabilized");
        assert_eq!(page, 2);
        assert!(!csv);
    }

    #[test]
    fn test_parse_repeated_skip() {
        let cli = Cli::try_parse_from(["cajero", "import", "s.json", "--skip", "m1", "--skip", "m2"]).unwrap();
        let Commands::Import { skip, force, .. } = cli.command else {
            panic!("expected import");
        };
        assert_eq!(skip, vec!["m1", "m2"]);
        assert!(!force);
    }
}
