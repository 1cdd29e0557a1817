mod auth;
mod client;

pub use auth::TerminalPrompt;
pub use client::SheetsClient;

// Re-export clear_tokens for CLI usage
pub use auth::clear_tokens as clear_sheets_tokens;

use crate::error::Result;
use crate::models::NamedTable;
use async_trait::async_trait;

/// Identity of a spreadsheet returned by the create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSpreadsheet {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait SpreadsheetOperations {
    /// Create a spreadsheet with one sheet per table, in order.
    async fn create_spreadsheet(
        &self,
        title: &str,
        tables: &[NamedTable],
    ) -> Result<CreatedSpreadsheet>;

    async fn list_files(&self) -> Result<Vec<RemoteFile>>;

    /// Make `folder_id` the only parent of `file_id`.
    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<()>;
}
