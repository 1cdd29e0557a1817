use crate::config::Config;
use crate::error::Result;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration and credential paths
    Paths,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let config = Config::load()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?config.google.client_secret_path()?, "Client secret path");
    info!(path = ?config.google.token_path()?, "Credential path");

    Ok(())
}
