use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "csv-sheets-export";

// Drive folder that exported spreadsheets are filed under.
const DEFAULT_FOLDER_ID: &str = "144EFimPBTcoHnAzBpeoEcbqN-yeTLAqe";

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client configuration downloaded from the Google Cloud console
    pub client_secret_file: Option<PathBuf>,
    /// Where the authorization grant is persisted between runs
    pub token_file: Option<PathBuf>,
    pub scopes: Vec<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_secret_file: None,
            token_file: None,
            scopes: vec![SPREADSHEETS_SCOPE.to_string(), DRIVE_SCOPE.to_string()],
        }
    }
}

impl GoogleConfig {
    pub fn client_secret_path(&self) -> Result<PathBuf> {
        match &self.client_secret_file {
            Some(path) => Ok(path.clone()),
            None => Config::config_dir().map(|dir| dir.join("client_secret.json")),
        }
    }

    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => Config::cache_file("token.json"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    /// Drive folder ID the new spreadsheet is moved into
    pub folder_id: String,
    /// File extension (without the dot) of the files to export
    pub extension: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            folder_id: DEFAULT_FOLDER_ID.to_string(),
            extension: "csv".to_string(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        if config.export.folder_id.is_empty() {
            return Err(AppError::Config(
                "export.folder_id must not be empty".to_string(),
            ));
        }

        if config.export.extension.is_empty() {
            return Err(AppError::Config(
                "export.extension must not be empty".to_string(),
            ));
        }

        if config.google.scopes.is_empty() {
            return Err(AppError::Config(
                "google.scopes must list at least one scope".to_string(),
            ));
        }

        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_config_home()
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            google: GoogleConfig {
                client_secret_file: Some(PathBuf::from("/tmp/secret.json")),
                token_file: Some(PathBuf::from("/tmp/token.json")),
                scopes: vec!["scope_a".to_string()],
            },
            export: ExportConfig {
                folder_id: "folder_123".to_string(),
                extension: "tsv".to_string(),
            },
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::parse(&serialized).unwrap();

        assert_eq!(
            config.google.client_secret_file,
            deserialized.google.client_secret_file
        );
        assert_eq!(config.google.scopes, deserialized.google.scopes);
        assert_eq!(config.export.folder_id, deserialized.export.folder_id);
        assert_eq!(config.export.extension, deserialized.export.extension);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.export.folder_id, DEFAULT_FOLDER_ID);
        assert_eq!(config.export.extension, "csv");
        assert_eq!(config.google.scopes, vec![SPREADSHEETS_SCOPE, DRIVE_SCOPE]);
        assert!(config.google.token_file.is_none());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [export]
            folder_id = "other_folder"
            "#,
        )
        .unwrap();

        assert_eq!(config.export.folder_id, "other_folder");
        assert_eq!(config.export.extension, "csv");
        assert_eq!(config.google.scopes.len(), 2);
    }

    #[test]
    fn test_explicit_paths_are_used() {
        let config = GoogleConfig {
            client_secret_file: Some(PathBuf::from("secret.json")),
            token_file: Some(PathBuf::from("token.json")),
            ..Default::default()
        };

        assert_eq!(
            config.client_secret_path().unwrap(),
            PathBuf::from("secret.json")
        );
        assert_eq!(config.token_path().unwrap(), PathBuf::from("token.json"));
    }

    #[test]
    fn test_empty_folder_id_rejected() {
        let result = Config::parse(
            r#"
            [export]
            folder_id = ""
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_empty_extension_rejected() {
        let result = Config::parse(
            r#"
            [export]
            extension = ""
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_empty_scopes_rejected() {
        let result = Config::parse(
            r#"
            [google]
            scopes = []
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
