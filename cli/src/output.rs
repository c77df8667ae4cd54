//! Output formatting

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `data` as JSON/YAML, or the rows built from it as a table
    pub fn print<T, R, F>(&self, data: &T, rows: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        R: Tabled,
        F: FnOnce(&T) -> Vec<R>,
    {
        println!("{}", self.render(data, rows)?);
        Ok(())
    }

    pub fn render<T, R, F>(&self, data: &T, rows: F) -> Result<String>
    where
        T: Serialize + ?Sized,
        R: Tabled,
        F: FnOnce(&T) -> Vec<R>,
    {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(data).context("encoding JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(data).context("encoding YAML"),
            OutputFormat::Table => Ok(Table::new(rows(data)).with(Style::rounded()).to_string()),
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, OutputFormat::Table)
    }
}

/// Table cell for an optional message
pub fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        name: String,
    }

    fn rows(items: &[Item]) -> Vec<Row> {
        items.iter().map(|i| Row { name: i.name.to_string() }).collect()
    }

    #[test]
    fn test_formats() {
        let items = [Item { name: "email" }];

        let json = OutputFormat::Json.render(&items[..], rows).unwrap();
        assert!(json.contains("\"name\": \"email\""));

        let yaml = OutputFormat::Yaml.render(&items[..], rows).unwrap();
        assert!(yaml.contains("name: email"));

        let table = OutputFormat::Table.render(&items[..], rows).unwrap();
        assert!(table.contains("email"));
        assert!(table.contains("name"));
    }
}
