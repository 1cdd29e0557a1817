use crate::config::Config;
use crate::error::Result;
use crate::sheets::{SheetsClient, TerminalPrompt, clear_sheets_tokens};
use tracing::info;

pub async fn execute(reset: bool) -> Result<()> {
    let config = Config::load()?;

    if reset {
        clear_sheets_tokens(&config.google.token_path()?)?;
    }

    let _client = SheetsClient::new(&config.google, &TerminalPrompt).await?;

    info!("Google authorization verified");

    Ok(())
}
