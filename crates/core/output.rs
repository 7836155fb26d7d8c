use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use eyre::{Result, WrapErr};
use log::trace;
use serde_json::Value;
use unpaywall::normalize::Row;

/// The formats rows can be printed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format '{other}', expected one of table, csv or json"
            )),
        }
    }
}

/// Collects normalized rows and renders them once every row has been seen.
///
/// Columns are only known after the last row arrived, a row missing a field gets an empty cell.
pub struct Processor {
    format: OutputFormat,
    fields: Option<Vec<String>>,
    rows: Vec<Row>,
}

impl Processor {
    pub fn new(format: OutputFormat, fields: Option<&str>) -> Self {
        let fields = fields.map(|fields| {
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        });

        Self {
            format,
            fields,
            rows: Vec::new(),
        }
    }

    pub fn process(&mut self, mut row: Row) {
        if let Some(fields) = &self.fields {
            row.retain(|key, _| fields.contains(key));
        }
        self.rows.push(row);
    }

    pub fn output(self) -> Result<String> {
        trace!("Writing {} rows as {:?}", self.rows.len(), self.format);
        match self.format {
            OutputFormat::Json => {
                let mut out = serde_json::to_string_pretty(&self.rows)
                    .wrap_err("Cannot write rows as JSON")?;
                out.push('\n');
                Ok(out)
            }
            OutputFormat::Csv => self.csv(),
            OutputFormat::Table => Ok(self.table()),
        }
    }

    /// The `--fields` when given, otherwise every key in the order it was first seen.
    fn columns(&self) -> Vec<String> {
        if let Some(fields) = &self.fields {
            return fields.clone();
        }

        let mut columns: Vec<String> = Vec::new();
        for key in self.rows.iter().flat_map(Row::keys) {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        columns
    }

    fn cells<'a>(&'a self, columns: &'a [String]) -> impl Iterator<Item = Vec<String>> + 'a {
        self.rows
            .iter()
            .map(move |row| columns.iter().map(|c| cell(row.get(c))).collect())
    }

    fn csv(&self) -> Result<String> {
        let columns = self.columns();
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&columns)
            .wrap_err("Cannot write CSV header")?;
        for record in self.cells(&columns) {
            writer
                .write_record(&record)
                .wrap_err("Cannot write CSV record")?;
        }

        let bytes = writer
            .into_inner()
            .map_err(csv::IntoInnerError::into_error)
            .wrap_err("Cannot flush CSV output")?;
        String::from_utf8(bytes).wrap_err("CSV output is not valid UTF-8")
    }

    fn table(&self) -> String {
        let columns = self.columns();
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(&columns);
        for record in self.cells(&columns) {
            table.add_row(record);
        }
        format!("{table}\n")
    }
}

/// Renders a value for a single cell, nested values such as the `location` stay one JSON cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
