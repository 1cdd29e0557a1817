use crate::config::Config;
use crate::error::Result;
use crate::export::ExportEngine;
use crate::sheets::{SheetsClient, TerminalPrompt};
use std::path::Path;
use tracing::info;

pub async fn execute(root: &Path, subdir: &Path) -> Result<()> {
    let config = Config::load()?;
    let sheets_client = SheetsClient::new(&config.google, &TerminalPrompt).await?;

    let engine = ExportEngine::new(config.export, sheets_client);
    let spreadsheet_id = engine.export(root, subdir).await?;

    info!(id = spreadsheet_id, "Export completed");

    Ok(())
}
