use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::error::{FeatureError, Result};
use crate::models::FeatureTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(FeatureError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Write the feature table to `path`, creating parent directories.
pub async fn export_table(table: &FeatureTable, path: &Path, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let bytes = match format {
        ExportFormat::Csv => to_csv(table)?,
        ExportFormat::Json => to_json(table)?,
    };
    tokio::fs::write(path, bytes).await?;

    tracing::info!("Wrote {} rows to {}", table.rows(), path.display());
    Ok(())
}

/// Key columns first, then numeric columns; missing values as empty cells.
pub fn to_csv(table: &FeatureTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = table.key_names().chain(table.column_names()).collect();
    writer.write_record(&header)?;

    for row in 0..table.rows() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.extend(table.keys().iter().map(|(_, values)| values[row].clone()));
        record.extend(table.columns().iter().map(|(_, values)| format_cell(values[row])));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| FeatureError::Io(std::io::Error::new(e.error().kind(), e.to_string())))
}

/// Array of row objects; missing values as `null`.
pub fn to_json(table: &FeatureTable) -> Result<Vec<u8>> {
    let mut rows = Vec::with_capacity(table.rows());

    for row in 0..table.rows() {
        let mut record = Map::new();
        for (name, values) in table.keys() {
            record.insert(name.clone(), Value::String(values[row].clone()));
        }
        for (name, values) in table.columns() {
            let value = Number::from_f64(values[row]).map_or(Value::Null, Value::Number);
            record.insert(name.clone(), value);
        }
        rows.push(Value::Object(record));
    }

    Ok(serde_json::to_vec_pretty(&rows)?)
}

fn format_cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> FeatureTable {
        let mut table = FeatureTable::new(2);
        table
            .insert_key("HomeTeam", vec!["Arsenal".to_string(), "Spurs".to_string()])
            .unwrap();
        table.insert_column("HomeTeamELO", vec![1500.0, 1492.5]).unwrap();
        table.insert_column("HomeTeamProportionShotsOnTarget", vec![0.25, f64::NAN]).unwrap();
        table
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "parquet".parse::<ExportFormat>(),
            Err(FeatureError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_layout() {
        let bytes = to_csv(&small_table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "HomeTeam,HomeTeamELO,HomeTeamProportionShotsOnTarget");
        assert_eq!(lines[1], "Arsenal,1500,0.25");
        assert_eq!(lines[2], "Spurs,1492.5,");
    }

    #[test]
    fn test_json_nulls_missing_values() {
        let bytes = to_json(&small_table()).unwrap();
        let rows: Vec<Value> = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["HomeTeam"], "Arsenal");
        assert_eq!(rows[0]["HomeTeamELO"], 1500.0);
        assert!(rows[1]["HomeTeamProportionShotsOnTarget"].is_null());
    }

    #[tokio::test]
    async fn test_export_creates_directories() {
        let dir = std::env::temp_dir().join(format!("matchelo-export-{}", std::process::id()));
        let path = dir.join("nested").join("features.csv");

        export_table(&small_table(), &path, ExportFormat::Csv).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with("HomeTeam,"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
