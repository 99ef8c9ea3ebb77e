//! Row-major copy of a table's cell contents.
//!
//! A sort reorders the grid and then writes every cell back in place, so no
//! row element is moved and ids, classes and styles stay where they were.

use rayon::prelude::*;

use crate::error::TableError;
use crate::format::{text_content, SortValue};
use super::table::Table;

/// Row count above which cells are classified in parallel
const PARALLEL_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    cols: usize,
}

impl Grid {
    /// Copy the content of every cell, using the header row's cell count as the width
    pub fn snapshot(table: &Table) -> Result<Self, TableError> {
        let header = table
            .header()
            .ok_or_else(|| TableError::EmptyTable(table.id().clone()))?;
        let cols = header.cells.len();

        let mut rows = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows().iter().enumerate() {
            if row.cells.len() < cols {
                return Err(TableError::RaggedRow {
                    table: table.id().clone(),
                    row: row_idx,
                    expected: cols,
                    found: row.cells.len(),
                });
            }
            rows.push(row.cells[..cols].iter().map(|c| c.content.clone()).collect());
        }

        Ok(Self { rows, cols })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn get_row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(|r| r.as_slice())
    }

    /// Detach the header row so only data rows are reordered
    pub fn take_header(&mut self) -> Option<Vec<String>> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }

    pub fn prepend_header(&mut self, header: Vec<String>) {
        self.rows.insert(0, header);
    }

    pub fn reverse_rows(&mut self) {
        self.rows.reverse();
    }

    /// Stable sort of all rows, largest value first, keyed on the text of `col`
    pub fn sort_rows_descending(&mut self, col: usize) {
        let rows = std::mem::take(&mut self.rows);
        let use_parallel = rows.len() >= PARALLEL_THRESHOLD;

        let classify = |row: Vec<String>| {
            let key = row
                .get(col)
                .map(|content| SortValue::classify(&text_content(content)))
                .unwrap_or_else(|| SortValue::Text(String::new()));
            (key, row)
        };

        let mut keyed: Vec<(SortValue, Vec<String>)> = if use_parallel {
            rows.into_par_iter().map(classify).collect()
        } else {
            rows.into_iter().map(classify).collect()
        };

        let cmp_fn = |a: &(SortValue, Vec<String>), b: &(SortValue, Vec<String>)| b.0.cmp(&a.0);

        if use_parallel {
            keyed.par_sort_by(cmp_fn);
        } else {
            keyed.sort_by(cmp_fn);
        }

        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
    }

    /// Overwrite each live cell's content with the grid's, row by row
    pub fn commit(self, table: &mut Table) -> Result<(), TableError> {
        if self.rows.len() != table.row_count() || self.cols != table.col_count() {
            return Err(TableError::DimensionMismatch {
                table: table.id().clone(),
                grid_rows: self.rows.len(),
                grid_cols: self.cols,
                table_rows: table.row_count(),
                table_cols: table.col_count(),
            });
        }

        let table_id = table.id().clone();
        for (row_idx, (row, contents)) in table.rows.iter_mut().zip(self.rows).enumerate() {
            if row.cells.len() < contents.len() {
                return Err(TableError::RaggedRow {
                    table: table_id,
                    row: row_idx,
                    expected: contents.len(),
                    found: row.cells.len(),
                });
            }
            for (cell, content) in row.cells.iter_mut().zip(contents) {
                cell.content = content;
            }
        }

        Ok(())
    }
}
