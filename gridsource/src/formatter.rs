use colored::*;
use gridsource_core::{ColumnSpec, GetRowsError, Page, Row};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// A page rendered as a text table.
pub struct PageTable(pub Page);

pub struct ColumnList(pub &'static [ColumnSpec]);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<GetRowsError> for FormattedString {
    fn from(err: GetRowsError) -> Self {
        let title = match &err {
            GetRowsError::Configuration(_) => "Configuration Error:",
            GetRowsError::Remote(_) => "Request Failed:",
            GetRowsError::Shape(_) => "Unexpected Record:",
            GetRowsError::Superseded { .. } => "Discarded:",
        };

        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<ColumnList> for FormattedString {
    fn from(ColumnList(columns): ColumnList) -> Self {
        let rows: Vec<[String; 3]> = columns
            .iter()
            .map(|column| {
                let column_type = column
                    .column_type
                    .and_then(|t| serde_json::to_value(t).ok())
                    .and_then(|t| t.as_str().map(str::to_string))
                    .unwrap_or_else(|| "-".to_string());

                [
                    column.field.to_string(),
                    column.header_name.to_string(),
                    column_type,
                ]
            })
            .collect();

        FormattedString(table(["Field", "Header", "Type"], &rows))
    }
}

impl From<PageTable> for FormattedString {
    fn from(PageTable(page): PageTable) -> Self {
        let total = match page.row_count {
            Some(count) => count.to_string(),
            None => "unknown".to_string(),
        };
        let summary = format!("{} rows of {} total", page.rows.len(), total);

        if page.rows.is_empty() {
            return FormattedString(format!("{}\n{}", "No rows found.".yellow(), summary.dimmed()));
        }

        let rows: Vec<[String; 5]> = page.rows.iter().map(row_cells).collect();
        let headers = ["ID", "Item Type", "Author", "Status", "Updated"];

        FormattedString(format!(
            "{}\n\n{}",
            table(headers, &rows),
            summary.dimmed()
        ))
    }
}

fn row_cells(row: &Row) -> [String; 5] {
    [
        row.id.clone(),
        row.item_type_id.clone(),
        row.creator.clone(),
        row.status.clone().unwrap_or_else(|| "-".to_string()),
        row.updated_at.clone().unwrap_or_else(|| "-".to_string()),
    ]
}

fn table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .zip(widths)
        .map(|(header, width)| format!("{:<width$}", header).bold().to_string())
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out.trim_end().to_string()
}
