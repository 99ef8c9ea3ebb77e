//! Error types

use std::io;
use std::path::PathBuf;

use crate::alerts::AlertError;
use crate::table::table::{ElementId, TableId};

/// Errors raised while sorting or rewriting a table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("table {0} has no header row")]
    EmptyTable(TableId),

    #[error("header cell {header:?} is not a child of the header row of table {table}")]
    HeaderNotFound { table: TableId, header: ElementId },

    #[error("no header labelled {label:?} in table {table}")]
    UnknownHeader { table: TableId, label: String },

    #[error("row {row} of table {table} has {found} cells, header has {expected}")]
    RaggedRow {
        table: TableId,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("grid is {grid_rows}x{grid_cols} but table {table} is {table_rows}x{table_cols}")]
    DimensionMismatch {
        table: TableId,
        grid_rows: usize,
        grid_cols: usize,
        table_rows: usize,
        table_cols: usize,
    },
}

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level error for the command line tool
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid input data: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("alert acknowledgment failed: {0}")]
    Alert(#[from] AlertError),
}
