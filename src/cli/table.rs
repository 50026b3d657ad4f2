//! Table formatting utilities for CLI list commands
//!
//! List commands describe their columns once and emit typed rows; the
//! formatter renders them as a table, JSON or CSV.

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde_json::{Map, Value};
use std::io::Write;
use tabled::{builder::Builder, settings::Style};

use crate::api::models::Money;
use crate::cli::helpers::format_number;
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Resource ID
    Id(i64),
    /// Plain text
    Text(String),
    /// Status with color coding (ENABLED/ACTIVE green, PAUSED yellow)
    Status(String),
    /// Optional amount with currency
    Money(Option<Money>),
    /// Optional count with thousands separators
    Count(Option<u64>),
    /// Comma-separated list
    List(Vec<String>),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn status(s: impl ToString) -> Self {
        CellValue::Status(s.to_string())
    }

    /// Value for table display
    pub fn display(&self) -> String {
        match self {
            CellValue::Status(s) => status_style(s),
            CellValue::Count(n) => n.map(format_number).unwrap_or_else(|| "-".to_string()),
            CellValue::Money(None) | CellValue::Empty => "-".to_string(),
            _ => self.raw(),
        }
    }

    /// Value for CSV output
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.to_string(),
            CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Money(m) => m.as_ref().map(|m| m.to_string()).unwrap_or_default(),
            CellValue::Count(n) => n.map(|n| n.to_string()).unwrap_or_default(),
            CellValue::List(items) => items.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Value for JSON output
    pub fn json(&self) -> Value {
        match self {
            CellValue::Id(id) => Value::from(*id),
            CellValue::Count(Some(n)) => Value::from(*n),
            CellValue::List(items) => Value::from(items.clone()),
            CellValue::Money(None) | CellValue::Count(None) | CellValue::Empty => Value::Null,
            _ => Value::from(self.raw()),
        }
    }
}

/// Color a status string for terminal display
pub fn status_style(s: &str) -> String {
    match s {
        "ENABLED" | "ACTIVE" | "RUNNING" => style(s).green().to_string(),
        "PAUSED" => style(s).yellow().to_string(),
        "NOT_RUNNING" | "DELETED" => style(s).red().to_string(),
        _ => s.to_string(),
    }
}

/// Column definition for table output
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self { key, header }
    }
}

/// A single row of typed cells keyed by column
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Renders typed rows in the requested output format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    title: String,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], title: impl Into<String>) -> Self {
        Self {
            columns,
            title: title.into(),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                let headers: Vec<String> = self.columns.iter().map(|c| c.header.to_string()).collect();
                let body: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        self.columns
                            .iter()
                            .map(|c| row.get(c.key).map(CellValue::display).unwrap_or_else(|| "-".to_string()))
                            .collect()
                    })
                    .collect();
                print_table(&self.title, &headers, &body);
                Ok(())
            }
            OutputFormat::Json => {
                let items: Vec<Value> = rows
                    .iter()
                    .map(|row| {
                        let mut obj = Map::new();
                        for c in self.columns {
                            let v = row.get(c.key).map(CellValue::json).unwrap_or(Value::Null);
                            obj.insert(c.key.to_string(), v);
                        }
                        Value::Object(obj)
                    })
                    .collect();
                print_json(&items)
            }
            OutputFormat::Csv => {
                let headers: Vec<String> = self.columns.iter().map(|c| c.key.to_string()).collect();
                let body: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        self.columns
                            .iter()
                            .map(|c| row.get(c.key).map(CellValue::raw).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                write_csv(std::io::stdout().lock(), &headers, &body)
            }
        }
    }
}

/// Render a table with a header row
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.as_ref().to_string()));
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Print a titled table
pub fn print_table<S: AsRef<str>>(title: &str, headers: &[S], rows: &[Vec<String>]) {
    if !title.is_empty() {
        println!("{}", style(title).bold().cyan());
    }
    println!("{}", render_table(headers, rows));
}

/// Pretty-print any serializable value as JSON on stdout
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Write a header and rows as CSV
pub fn write_csv<W: Write, S: AsRef<str>>(writer: W, headers: &[S], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers.iter().map(|h| h.as_ref())).into_diagnostic()?;
    for row in rows {
        wtr.write_record(row).into_diagnostic()?;
    }
    wtr.flush().into_diagnostic()?;
    Ok(())
}

/// Write CSV to a file path
pub fn write_csv_file<S: AsRef<str>>(path: &std::path::Path, headers: &[S], rows: &[Vec<String>]) -> Result<()> {
    let file = std::fs::File::create(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(CellValue::Count(Some(12345)).display(), "12,345");
        assert_eq!(CellValue::Count(Some(12345)).raw(), "12345");
        assert_eq!(CellValue::Money(None).display(), "-");
        assert_eq!(CellValue::Money(None).raw(), "");
        assert_eq!(CellValue::List(vec!["US".into(), "CA".into()]).raw(), "US, CA");
        assert_eq!(CellValue::Id(7).json(), Value::from(7));
        assert_eq!(CellValue::Empty.json(), Value::Null);
    }

    #[test]
    fn test_status_style_plain_without_colors() {
        console::set_colors_enabled(false);
        assert_eq!(status_style("ENABLED"), "ENABLED");
    }

    #[test]
    fn test_render_table_contains_cells() {
        let out = render_table(&["ID", "Name"], &[vec!["1".to_string(), "Alpha".to_string()]]);
        assert!(out.contains("ID"));
        assert!(out.contains("Alpha"));
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &["name", "countries"], &[vec!["A".to_string(), "US, CA".to_string()]]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "name,countries\nA,\"US, CA\"\n");
    }
}
