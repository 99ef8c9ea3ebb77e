//! Header-click sorting for Table

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::TableError;
use super::grid::Grid;
use super::table::{ElementId, Table};

/// How far the "last sorted column" memory reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortScope {
    /// Every table remembers its own last sorted column
    #[default]
    PerTable,
    /// One memory shared by every table on the page
    Page,
}

/// What a header click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAction {
    /// Fresh descending sort on a newly clicked column
    Sorted,
    /// Same column clicked again, current row order reversed
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOutcome {
    pub column: usize,
    pub action: SortAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub last_column: Option<usize>,
}

/// Position of `header` among the cells of the table's header row
pub fn resolve_header_index(table: &Table, header: ElementId) -> Option<usize> {
    table.header()?.cells.iter().position(|c| c.id() == header)
}

#[derive(Debug, Default)]
pub struct SortEngine {
    scope: SortScope,
    page_state: SortState,
    table_states: HashMap<ElementId, SortState>,
}

impl SortEngine {
    pub fn new(scope: SortScope) -> Self {
        Self {
            scope,
            page_state: SortState::default(),
            table_states: HashMap::new(),
        }
    }

    /// Sort state that applies to `table`
    pub fn state(&self, table: &Table) -> SortState {
        match self.scope {
            SortScope::Page => self.page_state,
            SortScope::PerTable => self
                .table_states
                .get(&table.element_id())
                .copied()
                .unwrap_or_default(),
        }
    }

    fn state_mut(&mut self, table: &Table) -> &mut SortState {
        match self.scope {
            SortScope::Page => &mut self.page_state,
            SortScope::PerTable => self.table_states.entry(table.element_id()).or_default(),
        }
    }

    /// Handle a click on a header cell.
    ///
    /// A column other than the last sorted one gets a fresh descending sort;
    /// the same column again reverses the current row order. The header row
    /// is never compared and is written back unchanged.
    pub fn sort_by_header(&mut self, table: &mut Table, header: ElementId) -> Result<SortOutcome, TableError> {
        let column = resolve_header_index(table, header).ok_or_else(|| {
            warn!(table = %table.id(), "clicked header is not in the header row");
            TableError::HeaderNotFound {
                table: table.id().clone(),
                header,
            }
        })?;

        let mut grid = Grid::snapshot(table)?;
        let header_row = grid
            .take_header()
            .ok_or_else(|| TableError::EmptyTable(table.id().clone()))?;

        let action = if self.state(table).last_column == Some(column) {
            grid.reverse_rows();
            SortAction::Reversed
        } else {
            grid.sort_rows_descending(column);
            SortAction::Sorted
        };

        grid.prepend_header(header_row);
        grid.commit(table)?;

        self.state_mut(table).last_column = Some(column);

        debug!(table = %table.id(), column, ?action, "table sorted");

        Ok(SortOutcome { column, action })
    }

    /// Handle a click on the header cell whose text is `label`
    pub fn sort_by_label(&mut self, table: &mut Table, label: &str) -> Result<SortOutcome, TableError> {
        let header = table.header_by_label(label).ok_or_else(|| TableError::UnknownHeader {
            table: table.id().clone(),
            label: label.to_string(),
        })?;
        self.sort_by_header(table, header)
    }
}
