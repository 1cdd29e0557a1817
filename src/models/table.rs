use crate::error::{AppError, Result};
use google_sheets4::api::{CellData, ExtendedValue, RowData};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Rows of string cells exactly as they appear in the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a comma-delimited file into a table.
    ///
    /// The file handle is owned by the reader and released when this returns,
    /// including on parse errors.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| AppError::Csv(format!("Failed to open {:?}: {}", path, e)))?;

        Self::from_csv_reader(reader)
            .map_err(|e| AppError::Csv(format!("Failed to parse {:?}: {}", path, e)))
    }

    #[cfg(test)]
    pub fn from_reader<R: Read>(rdr: R) -> std::result::Result<Self, csv::Error> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);

        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
    ) -> std::result::Result<Self, csv::Error> {
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table together with the title of the sheet it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTable {
    pub title: String,
    pub table: Table,
}

/// A matched source file: its base name and the path it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
}

impl SourceFile {
    /// Resolve a scanned base name against `root/subdir`.
    pub fn resolve(root: &Path, subdir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: root.join(subdir).join(name),
        }
    }
}

pub trait ToRowData {
    /// Convert to Sheets row data, one string-valued cell per field.
    fn to_row_data(&self) -> Vec<RowData>;
}

impl ToRowData for Table {
    fn to_row_data(&self) -> Vec<RowData> {
        self.rows
            .iter()
            .map(|row| RowData {
                values: Some(
                    row.iter()
                        .map(|value| CellData {
                            user_entered_value: Some(ExtendedValue {
                                string_value: Some(value.clone()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) fn mock_table(rows: &[&[&str]]) -> Table {
        Table {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}
