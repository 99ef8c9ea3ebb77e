use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Error;
use crate::format::escape_html;
use crate::table::{Cell, Row, Table};

/// Detected file format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect format from file extension
    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tsv => b'\t',
        }
    }
}

/// Result of loading a file, including any warnings
pub struct LoadResult {
    pub rows: Vec<Vec<String>>,
    pub warnings: Vec<String>,
}

pub struct FileIO {
    pub file_path: PathBuf,
    delimiter: u8,
}

impl FileIO {
    pub fn new(file_path: PathBuf, delimiter: Option<u8>) -> Self {
        let delimiter = delimiter
            .or_else(|| FileFormat::from_extension(&file_path).map(|f| f.delimiter()))
            .unwrap_or(b',');
        Self { file_path, delimiter }
    }

    pub fn file_name(&self) -> String {
        self.file_path.display().to_string()
    }

    /// Read every record; short rows are padded to the widest row
    pub fn load_rows(&self) -> Result<LoadResult, Error> {
        let file = File::open(&self.file_path)?;
        let reader = BufReader::with_capacity(1 << 20, file); // 1 MB

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut max_cols: usize = 0;
        let mut needs_padding = false;

        for result in csv_reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            if row.len() > max_cols {
                if max_cols > 0 {
                    needs_padding = true;
                }
                max_cols = row.len();
            } else if row.len() < max_cols {
                needs_padding = true;
            }

            rows.push(row);
        }

        let mut warnings = Vec::new();

        if needs_padding {
            warnings.push(format!(
                "Padded rows with empty cells (max width: {} columns)",
                max_cols
            ));
            for row in rows.iter_mut() {
                if row.len() < max_cols {
                    row.resize(max_cols, String::new());
                }
            }
        }

        debug!(file = %self.file_name(), rows = rows.len(), cols = max_cols, "loaded input");

        Ok(LoadResult { rows, warnings })
    }
}

/// Turn raw text rows into a table, first row is the header.
///
/// Header roles and link targets come from the configured column
/// descriptors; every other cell is escaped text.
pub fn build_table(rows: Vec<Vec<String>>, config: &Config, table_id: &str) -> Table {
    let mut rows = rows.into_iter();
    let Some(header_text) = rows.next() else {
        return Table::new(table_id, Vec::new());
    };

    let descriptors: Vec<_> = header_text.iter().map(|h| config.column(h)).collect();
    let row_id_col = config
        .row_id_column
        .as_ref()
        .and_then(|label| header_text.iter().position(|h| h == label));

    if let (Some(label), None) = (&config.row_id_column, row_id_col) {
        warn!(column = %label, "row id column not found in header");
    }

    let header_cells = header_text
        .iter()
        .zip(&descriptors)
        .map(|(text, desc)| {
            let cell = Cell::new(escape_html(text));
            match (*desc).and_then(|d| d.role.clone()) {
                Some(role) => cell.with_role(role),
                None => cell,
            }
        })
        .collect();

    let mut table_rows = vec![Row::new(header_cells)];

    for values in rows {
        let dom_id = row_id_col.and_then(|c| values.get(c)).filter(|v| !v.is_empty()).cloned();

        let cells = values
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let text = escape_html(value);
                let link = descriptors
                    .get(col)
                    .copied()
                    .flatten()
                    .filter(|_| !value.is_empty())
                    .and_then(|d| d.link_for(value));
                match link {
                    Some(href) => Cell::new(format!(r#"<a href="{}">{}</a>"#, escape_html(&href), text)),
                    None => Cell::new(text),
                }
            })
            .collect();

        let row = Row::new(cells);
        table_rows.push(match dom_id {
            Some(id) => row.with_dom_id(id),
            None => row,
        });
    }

    Table::new(table_id, table_rows)
}

/// Write the page next to its destination, then move it into place
pub fn write_html(path: &Path, html: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(html.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
