pub mod table;
pub mod grid;
pub mod sort;
pub mod filter;
pub mod visibility;

pub use table::{Cell, ColumnRole, Document, ElementId, Row, Table, TableId, HIDDEN_CLASS};
pub use sort::{SortAction, SortEngine, SortOutcome, SortScope, SortState};
