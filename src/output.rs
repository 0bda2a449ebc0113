//! Text, CSV and JSON rendering of tables for the command line.

use crate::table::{Record, Table};
use anyhow::{Context, Result};
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Render a table in the requested format
pub fn render<R: Record>(table: &Table<R>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_text(table)),
        OutputFormat::Csv => render_csv(table),
        OutputFormat::Json => {
            serde_json::to_string_pretty(table.rows()).context("Failed to serialize table as JSON")
        }
    }
}

fn render_text<R: Record>(table: &Table<R>) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.columns().iter().map(|c| c.to_string()));
    for row in table {
        builder.push_record(row.cells());
    }

    let mut text = builder.build();
    text.with(Style::sharp());

    let (rows, cols) = table.shape();
    format!("{text}\nshape: ({rows}, {cols})")
}

fn render_csv<R: Record>(table: &Table<R>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .context("Failed to write CSV header")?;
    for row in table {
        writer
            .write_record(row.cells())
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryRecord;

    fn sample() -> Table<RepositoryRecord> {
        Table::new(vec![RepositoryRecord {
            name: "repo1".to_string(),
            default_branch: "main".to_string(),
            description: "tools, scripts and \"notes\"".to_string(),
            archived: false,
            is_fork: false,
            issues: 0,
            stars: 5,
            forks: 1,
            size: 100,
        }])
    }

    #[test]
    fn csv_quotes_awkward_fields() {
        let csv = render(&sample(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,default_branch,description,archived,is_fork,issues,stars,forks,size")
        );
        assert_eq!(
            lines.next(),
            Some(r#"repo1,main,"tools, scripts and ""notes""",false,false,0,5,1,100"#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn json_is_an_array_of_row_objects() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "repo1");
        assert_eq!(value[0]["stars"], 5);
        // field order follows the columns
        assert!(json.find("\"name\"").unwrap() < json.find("\"size\"").unwrap());
    }

    #[test]
    fn text_table_has_headers_then_shape() {
        let text = render(&sample(), OutputFormat::Table).unwrap();
        let header = text.find("default_branch").unwrap();
        let shape = text.find("shape: (1, 9)").unwrap();
        assert!(header < shape);
        assert!(text.ends_with("shape: (1, 9)"));
        assert!(text.contains("repo1"));
    }

    #[test]
    fn empty_csv_is_header_only() {
        let table: Table<RepositoryRecord> = Table::new(Vec::new());
        let csv = render(&table, OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
