use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::table::{ColumnRole, SortScope};

/// Describes how one CSV column is rendered
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ColumnDescriptor {
    /// Header text the descriptor applies to
    pub header: String,
    #[serde(default)]
    pub role: Option<ColumnRole>,
    /// Link target, `{value}` is replaced with the URL-encoded cell text
    #[serde(default)]
    pub link: Option<String>,
}

impl ColumnDescriptor {
    fn new(header: &str, role: ColumnRole, link: Option<&str>) -> Self {
        Self {
            header: header.to_string(),
            role: Some(role),
            link: link.map(str::to_string),
        }
    }

    pub fn link_for(&self, value: &str) -> Option<String> {
        self.link
            .as_ref()
            .map(|template| template.replace("{value}", &urlencoding::encode(value)))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlertConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl AlertConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_table_id")]
    pub table_id: String,
    #[serde(default)]
    pub sort_scope: SortScope,
    /// Header of the column whose text becomes each data row's `id`
    #[serde(default)]
    pub row_id_column: Option<String>,
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub alerts: AlertConfig,
}

fn default_title() -> String {
    "Screener results".to_string()
}

fn default_table_id() -> String {
    "sortable".to_string()
}

fn default_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("Ticker", ColumnRole::Ticker, Some("/stocks/{value}")),
        ColumnDescriptor::new("Company", ColumnRole::Company, None),
        ColumnDescriptor::new("Industry", ColumnRole::Industry, Some("/industries/{value}")),
        ColumnDescriptor::new("Sector", ColumnRole::Sector, Some("/sectors/{value}")),
        ColumnDescriptor::new("Country", ColumnRole::Country, Some("/countries/{value}")),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            table_id: default_table_id(),
            sort_scope: SortScope::default(),
            row_id_column: None,
            columns: default_columns(),
            alerts: AlertConfig::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Descriptor for a header, matched exactly
    pub fn column(&self, header: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.header == header)
    }
}
