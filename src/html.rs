//! HTML page generation
//!
//! Cell content is already markup and is emitted verbatim; only attribute
//! values and the page title are escaped.

use std::fmt::Write;

use crate::format::escape_html;
use crate::table::{Cell, Document, Row, Table};

/// Render every table of the document as one page
pub fn render_document(doc: &Document, title: &str) -> String {
    let tables: String = doc.tables.iter().map(render_table).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
{tables}</body>
</html>
"#,
        title = escape_html(title),
        css = inline_css(),
        tables = tables,
    )
}

pub fn render_table(table: &Table) -> String {
    let mut out = String::new();
    let _ = writeln!(out, r#"<table id="{}" class="sortable">"#, escape_html(&table.id().0));

    for (idx, row) in table.rows().iter().enumerate() {
        render_row(&mut out, row, idx == 0);
    }

    out.push_str("</table>\n");
    out
}

fn render_row(out: &mut String, row: &Row, is_header: bool) {
    out.push_str("<tr");
    if let Some(id) = &row.dom_id {
        let _ = write!(out, r#" id="{}""#, escape_html(id));
    }
    if !row.classes.is_empty() {
        let _ = write!(out, r#" class="{}""#, escape_html(&row.classes.join(" ")));
    }
    out.push('>');

    for cell in &row.cells {
        render_cell(out, cell, is_header);
    }

    out.push_str("</tr>\n");
}

fn render_cell(out: &mut String, cell: &Cell, is_header: bool) {
    let tag = if is_header { "th" } else { "td" };
    let _ = write!(out, "<{}", tag);

    if is_header {
        if let Some(role) = &cell.role {
            let _ = write!(out, r#" data-role="{}""#, escape_html(role.as_str()));
        }
        out.push_str(r#" onclick="sortBy(this)""#);
    }
    if let Some(display) = &cell.display {
        let _ = write!(out, r#" style="display: {}""#, escape_html(display));
    }

    let _ = write!(out, ">{}</{}>", cell.content, tag);
}

fn inline_css() -> &'static str {
    "table.sortable { border-collapse: collapse; } \
     th, td { padding: 4px 8px; } \
     th { cursor: pointer; } \
     tr.hidden { display: none; }"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnRole, HIDDEN_CLASS};

    fn sample() -> Table {
        let mut hidden = Cell::new("Apple Inc.");
        hidden.display = Some("none".to_string());

        let mut row = Row::new(vec![Cell::new(r#"<a href="/stocks/AAPL">AAPL</a>"#), hidden]).with_dom_id("alert-7");
        row.add_class(HIDDEN_CLASS);

        Table::new(
            "sortable",
            vec![
                Row::new(vec![
                    Cell::new("Ticker").with_role(ColumnRole::Ticker),
                    Cell::new("Company"),
                ]),
                row,
            ],
        )
    }

    #[test]
    fn test_render_table_markup() {
        let html = render_table(&sample());
        assert!(html.starts_with(r#"<table id="sortable" class="sortable">"#));
        assert!(html.contains(r#"<th data-role="ticker" onclick="sortBy(this)">Ticker</th>"#));
        assert!(html.contains(r#"<th onclick="sortBy(this)">Company</th>"#));
        assert!(html.contains(r#"<tr id="alert-7" class="hidden">"#));
        assert!(html.contains(r#"<td><a href="/stocks/AAPL">AAPL</a></td>"#));
        assert!(html.contains(r#"<td style="display: none">Apple Inc.</td>"#));
    }

    #[test]
    fn test_render_document_escapes_title() {
        let doc = Document::new(vec![sample()]);
        let html = render_document(&doc, "Gainers <today>");
        assert!(html.contains("<title>Gainers &lt;today&gt;</title>"));
        assert!(html.contains(r#"<table id="sortable""#));
    }
}
