pub mod console;
pub mod csv;

use crate::model::TableResult;

/// Output format for a single result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(format!("unknown format '{}' (expected text, json or csv)", other)),
        }
    }
}

pub fn render(table: &TableResult, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Text => Ok(console::render_table(table)),
        Format::Json => Ok(serde_json::to_string_pretty(table)?),
        Format::Csv => csv::to_csv(table),
    }
}
