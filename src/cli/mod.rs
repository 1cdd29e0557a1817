mod auth;
mod export;
mod show;

use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "csv-sheets-export")]
#[command(about = "Upload CSV reports to a new Google Sheets spreadsheet", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Export { root, subdir } => export::execute(root, subdir).await,
            Commands::Auth { reset } => auth::execute(*reset).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every CSV file found under ROOT, read from ROOT/SUBDIR, as one spreadsheet
    Export {
        /// Directory scanned for CSV files
        root: PathBuf,
        /// Directory below ROOT the files are read from
        subdir: PathBuf,
    },
    /// Authorize access to Google Sheets and Drive
    Auth {
        /// Discard the saved credentials and ask for consent again
        #[arg(long)]
        reset: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
