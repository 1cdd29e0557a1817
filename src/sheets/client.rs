use super::{CreatedSpreadsheet, RemoteFile, SpreadsheetOperations};
use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::models::{NamedTable, ToRowData};
use crate::sheets::auth::{AuthCodePrompt, GoogleAuth, load_application_secret};
use async_trait::async_trait;
use google_drive3::api::{DriveHub, File};
use google_sheets4::api::{
    GridData, Sheet, SheetProperties, Sheets, Spreadsheet, SpreadsheetProperties,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use tracing::{debug, instrument};

// Upper bound on entries fetched by the diagnostic listing.
const LIST_PAGE_SIZE: i32 = 100;

pub struct SheetsClient {
    sheets: Sheets<HttpsConnector<HttpConnector>>,
    drive: DriveHub<HttpsConnector<HttpConnector>>,
}

impl SheetsClient {
    /// Create a new SheetsClient with authorized access to Sheets and Drive.
    ///
    /// May block on `prompt` when no usable grant is cached.
    #[instrument(name = "Authenticating to Google", skip_all)]
    pub async fn new<P: AuthCodePrompt>(config: &GoogleConfig, prompt: &P) -> Result<Self> {
        let secret = load_application_secret(&config.client_secret_path()?).await?;
        let auth = GoogleAuth::new(&secret, &config.scopes, config.token_path()?)?;
        let grant = auth.authorize(prompt).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        let sheets = Sheets::new(client.clone(), grant.access_token.clone());
        let drive = DriveHub::new(client, grant.access_token);

        Ok(Self { sheets, drive })
    }
}

/// Build the create request: one sheet per table, each holding a single grid
/// anchored at A1.
pub(super) fn build_spreadsheet(title: &str, tables: &[NamedTable]) -> Spreadsheet {
    let sheets = tables
        .iter()
        .map(|named| Sheet {
            properties: Some(SheetProperties {
                title: Some(named.title.clone()),
                ..Default::default()
            }),
            data: Some(vec![GridData {
                row_data: Some(named.table.to_row_data()),
                ..Default::default()
            }]),
            ..Default::default()
        })
        .collect();

    Spreadsheet {
        properties: Some(SpreadsheetProperties {
            title: Some(title.to_string()),
            ..Default::default()
        }),
        sheets: Some(sheets),
        ..Default::default()
    }
}

#[async_trait]
impl SpreadsheetOperations for SheetsClient {
    #[instrument(name = "Creating spreadsheet", skip(self, tables), fields(sheets = tables.len()))]
    async fn create_spreadsheet(
        &self,
        title: &str,
        tables: &[NamedTable],
    ) -> Result<CreatedSpreadsheet> {
        let spreadsheet = build_spreadsheet(title, tables);

        let (_, result) = self
            .sheets
            .spreadsheets()
            .create(spreadsheet)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create spreadsheet: {}", e)))?;

        let id = result
            .spreadsheet_id
            .ok_or_else(|| AppError::Sheets("Created spreadsheet has empty ID".to_string()))?;

        Ok(CreatedSpreadsheet {
            id,
            url: result.spreadsheet_url,
        })
    }

    #[instrument(name = "Listing Drive files", skip_all)]
    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        let (_, file_list) = self
            .drive
            .files()
            .list()
            .page_size(LIST_PAGE_SIZE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to list files: {}", e)))?;

        let files = file_list
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|file| RemoteFile {
                id: file.id.unwrap_or_default(),
                name: file.name.unwrap_or_default(),
            })
            .collect();

        Ok(files)
    }

    #[instrument(name = "Moving spreadsheet", skip(self))]
    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<()> {
        let (_, file) = self
            .drive
            .files()
            .get(file_id)
            .param("fields", "parents")
            .supports_all_drives(true)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to get file parents: {}", e)))?;

        let previous_parents = file.parents.unwrap_or_default().join(",");
        debug!(%previous_parents, "Replacing parents");

        let mut call = self
            .drive
            .files()
            .update(File::default(), file_id)
            .add_parents(folder_id)
            .supports_all_drives(true);
        if !previous_parents.is_empty() {
            call = call.remove_parents(&previous_parents);
        }

        call.doit_without_upload()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to move file to folder: {}", e)))?;

        Ok(())
    }
}
