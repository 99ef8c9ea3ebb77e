use tracing::debug;

use super::table::{Cell, ColumnRole, Document};

const DISPLAY_NONE: &str = "none";

/// Hide a shown cell, or clear the display style of a hidden one
pub fn toggle_visibility(cell: &mut Cell) {
    if cell.display.as_deref() == Some(DISPLAY_NONE) {
        cell.display = None;
    } else {
        cell.display = Some(DISPLAY_NONE.to_string());
    }
}

/// Toggle both columns in every table that has a header for each role.
/// Returns the number of tables changed.
pub fn toggle_column_pair_visibility(doc: &mut Document, first: &ColumnRole, second: &ColumnRole) -> usize {
    let mut changed = 0;

    for table in doc.tables.iter_mut() {
        let (Some(a), Some(b)) = (table.column_with_role(first), table.column_with_role(second)) else {
            continue;
        };

        for row in table.rows.iter_mut() {
            if let Some(cell) = row.cells.get_mut(a) {
                toggle_visibility(cell);
            }
            if a != b {
                if let Some(cell) = row.cells.get_mut(b) {
                    toggle_visibility(cell);
                }
            }
        }

        debug!(table = %table.id(), %first, %second, "toggled column visibility");
        changed += 1;
    }

    changed
}
