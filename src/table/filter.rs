use tracing::debug;

use crate::format::link_text;
use super::table::{ColumnRole, Document, HIDDEN_CLASS};

/// Rows left visible and rows hidden by a category filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub shown: usize,
    pub hidden: usize,
}

/// Hide every data row whose category link text differs from `selected`.
///
/// An empty `selected` clears the filter. Tables without a column carrying
/// `role` are left alone.
pub fn filter_rows_by_category(doc: &mut Document, role: &ColumnRole, selected: &str) -> FilterSummary {
    let mut summary = FilterSummary::default();

    for table in doc.tables.iter_mut() {
        let Some(col) = table.column_with_role(role) else {
            continue;
        };

        let table_id = table.id().clone();
        for row in table.data_rows_mut() {
            let keep = selected.is_empty()
                || row
                    .cells
                    .get(col)
                    .map(|cell| link_text(&cell.content) == selected)
                    .unwrap_or(false);

            if keep {
                row.remove_class(HIDDEN_CLASS);
                summary.shown += 1;
            } else {
                row.add_class(HIDDEN_CLASS);
                summary.hidden += 1;
            }
        }

        debug!(table = %table_id, %role, selected, "category filter applied");
    }

    summary
}
