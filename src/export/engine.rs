use crate::config::ExportConfig;
use crate::error::{AppError, Result};
use crate::export::scan;
use crate::models::{NamedTable, SourceFile, Table};
use crate::sheets::SpreadsheetOperations;
use chrono::{DateTime, Local};
use indicatif::ProgressStyle;
use std::path::Path;
use tracing::{Span, debug, info, instrument, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Spreadsheet title for a run started at `now`.
pub(crate) fn document_title(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub struct ExportEngine<SC> {
    config: ExportConfig,
    sheets_client: SC,
}

impl<SC> ExportEngine<SC>
where
    SC: SpreadsheetOperations + Sync,
{
    pub fn new(config: ExportConfig, sheets_client: SC) -> Self {
        Self {
            config,
            sheets_client,
        }
    }

    /// Scan `root`, read every match from `root/subdir` and publish them as a
    /// new spreadsheet filed under the configured folder.
    ///
    /// Returns the ID of the created spreadsheet.
    #[instrument(name = "Export", skip_all)]
    pub async fn export(&self, root: &Path, subdir: &Path) -> Result<String> {
        let names = scan(root, &self.config.extension);
        info!(files = ?names, "Found files to export");

        let tables = self.convert(root, subdir, &names)?;
        self.publish(&document_title(Local::now()), &tables).await
    }

    #[instrument(name = "Reading files", skip_all)]
    fn convert(&self, root: &Path, subdir: &Path, names: &[String]) -> Result<Vec<NamedTable>> {
        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_message("Reading files");
        span.pb_set_length(names.len() as u64);

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let source = SourceFile::resolve(root, subdir, name);
            debug!(path = ?source.path, "Reading file");

            let table = Table::read_csv(&source.path)?;
            if table.is_empty() {
                warn!(path = ?source.path, "File has no records");
            }
            debug!(rows = table.len(), "Read file");

            tables.push(NamedTable {
                title: source.name,
                table,
            });
            span.pb_inc(1);
        }

        Ok(tables)
    }

    async fn publish(&self, title: &str, tables: &[NamedTable]) -> Result<String> {
        let created = self
            .sheets_client
            .create_spreadsheet(title, tables)
            .await?;
        info!(id = %created.id, url = ?created.url, "Created spreadsheet");

        let files = self.sheets_client.list_files().await?;
        info!(count = files.len(), "Listed Drive files");
        for file in &files {
            debug!(id = %file.id, name = %file.name, "Drive file");
        }

        if let Err(e) = self
            .sheets_client
            .move_to_folder(&created.id, &self.config.folder_id)
            .await
        {
            warn!(
                id = %created.id,
                "Spreadsheet was created but remains in its default location"
            );
            return Err(e);
        }
        info!(folder_id = %self.config.folder_id, "Moved spreadsheet to folder");

        Ok(created.id)
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::{Call, MockSheetsClient, engine};
    use super::*;
    use crate::models::table::test_helpers::mock_table;
    use chrono::{NaiveDate, TimeZone};
    use std::fs;

    fn created_title(calls: &[Call]) -> String {
        match &calls[0] {
            Call::Create { title, .. } => title.clone(),
            other => panic!("expected create call first, got {:?}", other),
        }
    }

    #[test]
    fn test_document_title_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap();
        assert_eq!(document_title(now), "2024-03-07");
    }

    #[tokio::test]
    async fn test_export_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "x,y\n1,2\n").unwrap();

        let client = MockSheetsClient::default();
        let id = engine(client.clone())
            .export(dir.path(), Path::new(""))
            .await
            .unwrap();
        assert_eq!(id, "sheet_123");

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            Call::Create { tables, .. } => assert_eq!(
                *tables,
                vec![NamedTable {
                    title: "a.csv".to_string(),
                    table: mock_table(&[&["x", "y"], &["1", "2"]]),
                }]
            ),
            other => panic!("expected create call first, got {:?}", other),
        }
        assert_eq!(calls[1], Call::List);
        assert_eq!(
            calls[2],
            Call::Move {
                file_id: "sheet_123".to_string(),
                folder_id: "folder_abc".to_string(),
            }
        );

        let title = created_title(&calls);
        assert!(
            NaiveDate::parse_from_str(&title, "%Y-%m-%d").is_ok(),
            "title should be a date, got {}",
            title
        );
    }

    #[tokio::test]
    async fn test_export_reads_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join("a.csv"), "1\n").unwrap();
        fs::write(repo.join("b.csv"), "2,3\n").unwrap();

        let client = MockSheetsClient::default();
        engine(client.clone())
            .export(dir.path(), Path::new("repo"))
            .await
            .unwrap();

        match &client.calls()[0] {
            Call::Create { tables, .. } => {
                let titles: Vec<&str> = tables.iter().map(|t| t.title.as_str()).collect();
                assert_eq!(titles, vec!["a.csv", "b.csv"]);
                assert_eq!(tables[1].table, mock_table(&[&["2", "3"]]));
            }
            other => panic!("expected create call first, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_export_empty_directory_still_creates_document() {
        let dir = tempfile::tempdir().unwrap();

        let client = MockSheetsClient::default();
        engine(client.clone())
            .export(dir.path(), Path::new(""))
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            Call::Create { tables, .. } => assert!(tables.is_empty()),
            other => panic!("expected create call first, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_aborts_before_publishing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "x\n").unwrap();

        let client = MockSheetsClient::default();
        let result = engine(client.clone())
            .export(dir.path(), Path::new("missing"))
            .await;

        assert!(matches!(result, Err(AppError::Csv(_))));
        assert!(client.calls().is_empty(), "no remote calls after a read error");
    }

    #[tokio::test]
    async fn test_create_failure_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();

        let client = MockSheetsClient {
            fail_create: true,
            ..Default::default()
        };
        let result = engine(client.clone())
            .export(dir.path(), Path::new(""))
            .await;

        assert!(matches!(result, Err(AppError::Sheets(_))));
        assert_eq!(client.calls().len(), 1, "no list or move after a failed create");
    }

    #[tokio::test]
    async fn test_list_failure_stops_before_move() {
        let dir = tempfile::tempdir().unwrap();

        let client = MockSheetsClient {
            fail_list: true,
            ..Default::default()
        };
        let result = engine(client.clone())
            .export(dir.path(), Path::new(""))
            .await;

        assert!(matches!(result, Err(AppError::Drive(_))));
        let calls = client.calls();
        assert_eq!(calls.len(), 2, "no move after a failed list");
        assert_eq!(calls[1], Call::List);
    }

    #[tokio::test]
    async fn test_move_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let client = MockSheetsClient {
            fail_move: true,
            ..Default::default()
        };
        let result = engine(client.clone())
            .export(dir.path(), Path::new(""))
            .await;

        assert!(matches!(result, Err(AppError::Drive(_))));
        assert_eq!(client.calls().len(), 3);
    }
}
