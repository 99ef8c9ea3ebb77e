use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

/// CSS class that marks a row as filtered out
pub const HIDDEN_CLASS: &str = "hidden";

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a table, row or cell element, stable for the element's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The `id` attribute of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId(pub String);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a column holds, annotated on its header cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ColumnRole {
    Ticker,
    Company,
    Industry,
    Sector,
    Country,
    Other(String),
}

impl ColumnRole {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnRole::Ticker => "ticker",
            ColumnRole::Company => "company",
            ColumnRole::Industry => "industry",
            ColumnRole::Sector => "sector",
            ColumnRole::Country => "country",
            ColumnRole::Other(name) => name,
        }
    }

    /// Parse a role name as written on the command line or in a `data-role` attribute
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ticker" => ColumnRole::Ticker,
            "company" => ColumnRole::Company,
            "industry" => ColumnRole::Industry,
            "sector" => ColumnRole::Sector,
            "country" => ColumnRole::Country,
            other => ColumnRole::Other(other.to_string()),
        }
    }
}

impl From<String> for ColumnRole {
    fn from(name: String) -> Self {
        ColumnRole::from_name(&name)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `<th>`/`<td>` element
#[derive(Debug, Clone)]
pub struct Cell {
    id: ElementId,
    /// Serialized inner markup, may contain links or icons
    pub content: String,
    /// Inline `display` style; `None` when unset
    pub display: Option<String>,
    /// Column role, only meaningful on header cells
    pub role: Option<ColumnRole>,
}

impl Cell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ElementId::next(),
            content: content.into(),
            display: None,
            role: None,
        }
    }

    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn is_hidden(&self) -> bool {
        self.display.as_deref() == Some("none")
    }
}

/// A `<tr>` element
#[derive(Debug, Clone)]
pub struct Row {
    id: ElementId,
    /// The row's `id` attribute
    pub dom_id: Option<String>,
    pub classes: Vec<String>,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            id: ElementId::next(),
            dom_id: None,
            classes: Vec::new(),
            cells,
        }
    }

    pub fn with_dom_id(mut self, dom_id: impl Into<String>) -> Self {
        self.dom_id = Some(dom_id.into());
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

/// A `<table>` element. Row 0 is the header row.
#[derive(Debug, Clone)]
pub struct Table {
    element_id: ElementId,
    id: TableId,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    pub fn new(id: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            element_id: ElementId::next(),
            id: TableId(id.into()),
            rows,
        }
    }

    /// Build a table of plain cells, first row becomes the header
    pub fn from_contents(id: impl Into<String>, cells: Vec<Vec<String>>) -> Self {
        let rows = cells
            .into_iter()
            .map(|row| Row::new(row.into_iter().map(Cell::new).collect()))
            .collect();
        Self::new(id, rows)
    }

    pub fn id(&self) -> &TableId {
        &self.id
    }

    /// Identity of the table element itself; unlike `id` it is never shared
    pub fn element_id(&self) -> ElementId {
        self.element_id
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count as defined by the header row
    pub fn col_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get_row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    pub fn get_row_mut(&mut self, row: usize) -> Option<&mut Row> {
        self.rows.get_mut(row)
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Data rows, header excluded
    pub fn data_rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut().skip(1)
    }

    /// Index of the column whose header cell carries `role`
    pub fn column_with_role(&self, role: &ColumnRole) -> Option<usize> {
        self.header()?
            .cells
            .iter()
            .position(|c| c.role.as_ref() == Some(role))
    }

    /// Id of the header cell whose text equals `label`
    pub fn header_by_label(&self, label: &str) -> Option<ElementId> {
        self.header()?
            .cells
            .iter()
            .find(|c| crate::format::text_content(&c.content) == label)
            .map(|c| c.id())
    }

    /// Current text of every cell in a column, header excluded
    pub fn column_text(&self, col: usize) -> Vec<String> {
        self.rows
            .iter()
            .skip(1)
            .map(|r| {
                r.cells
                    .get(col)
                    .map(|c| crate::format::text_content(&c.content))
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// All tables on a rendered page
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub tables: Vec<Table>,
}

impl Document {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id.0 == id)
    }

    pub fn row_by_dom_id(&self, dom_id: &str) -> Option<&Row> {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .find(|r| r.dom_id.as_deref() == Some(dom_id))
    }

    /// Remove the first row whose `id` attribute is `dom_id`
    pub fn remove_row_by_dom_id(&mut self, dom_id: &str) -> bool {
        for table in self.tables.iter_mut() {
            if let Some(pos) = table
                .rows
                .iter()
                .position(|r| r.dom_id.as_deref() == Some(dom_id))
            {
                table.rows.remove(pos);
                return true;
            }
        }
        false
    }
}
