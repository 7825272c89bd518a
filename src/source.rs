// Query-service boundary
// The warehouse is an opaque tabular source: SQL in, columns + rows out.

use crate::config::Secrets;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Full snapshot of the retail consumption table.
pub const RETAIL_CONSUMPTION_QUERY: &str = "SELECT *\nFROM retail_chile.iac_completo";

/// Full snapshot of the firm/employment segment table.
pub const BUSINESS_SEGMENT_QUERY: &str = "SELECT *\nFROM retail_chile.empresas_tramos_clean";

// ============================================================================
// TABULAR RESULT
// ============================================================================

/// Raw result of one query: a parallel column-name list plus rows of
/// untyped cells. Cells stay opaque (`serde_json::Value`) until the
/// cleaning stage decides what they mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TablePage {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        TablePage { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column index); absent cells read as null.
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// QUERY SERVICE
// ============================================================================

/// Opaque query collaborator. One blocking call per query, no retries;
/// transient-failure handling belongs to the implementation.
pub trait QueryService {
    fn run_query(&self, sql: &str) -> Result<TablePage>;
}

/// Connection parameters for a warehouse-backed implementation. The values
/// are opaque to this crate and are handed to the driver untouched.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub staging_dir: String,
    pub region: String,
}

impl ConnectionSettings {
    pub fn from_secrets(secrets: &Secrets) -> Self {
        ConnectionSettings {
            access_key_id: secrets.aws_access_key_id.clone(),
            secret_access_key: secrets.aws_secret_access_key.clone(),
            staging_dir: secrets.s3_staging_dir.clone(),
            region: secrets.aws_region.clone(),
        }
    }
}

// ============================================================================
// CSV SNAPSHOT SERVICE
// ============================================================================

/// Snapshot-backed query service: each registered query maps to a local CSV
/// export of the table it selects from. The CSV header row is the column
/// list. Used by the binaries and tests; a deployment against the live
/// warehouse substitutes its own `QueryService`.
pub struct CsvQueryService {
    data_dir: PathBuf,
    registry: HashMap<String, PathBuf>,
}

impl CsvQueryService {
    /// Service with the two fixed dashboard queries pre-registered.
    pub fn new(data_dir: &Path) -> Self {
        let mut service = CsvQueryService {
            data_dir: data_dir.to_path_buf(),
            registry: HashMap::new(),
        };
        service.register(RETAIL_CONSUMPTION_QUERY, "iac_completo.csv");
        service.register(BUSINESS_SEGMENT_QUERY, "empresas_tramos_clean.csv");
        service
    }

    /// Map a query to a snapshot file under the data directory.
    pub fn register(&mut self, sql: &str, filename: &str) {
        self.registry
            .insert(sql.to_string(), self.data_dir.join(filename));
    }
}

impl QueryService for CsvQueryService {
    fn run_query(&self, sql: &str) -> Result<TablePage> {
        let path = self
            .registry
            .get(sql)
            .with_context(|| format!("No snapshot registered for query: {}", sql.trim()))?;

        load_csv_page(path)
    }
}

/// Load a CSV snapshot into a `TablePage`. All cells come back as strings;
/// typing is the cleaner's job.
pub fn load_csv_page(path: &Path) -> Result<TablePage> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV snapshot: {}", path.display()))?;

    let columns: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line + 2, path.display())
        })?;
        rows.push(
            record
                .iter()
                .map(|cell| Value::String(cell.to_string()))
                .collect(),
        );
    }

    Ok(TablePage::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_snapshot(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_column_index_and_cell() {
        let page = TablePage::new(
            vec!["anio".to_string(), "mes".to_string()],
            vec![vec![Value::String("2024".to_string()), Value::String("1".to_string())]],
        );

        assert_eq!(page.column_index("mes"), Some(1));
        assert_eq!(page.column_index("missing"), None);
        assert_eq!(page.cell(0, 0), &Value::String("2024".to_string()));
        // Out-of-range cells read as null instead of panicking
        assert_eq!(page.cell(0, 5), &Value::Null);
        assert_eq!(page.cell(9, 0), &Value::Null);
    }

    #[test]
    fn test_csv_service_runs_registered_query() {
        let dir = std::env::temp_dir().join("retail_pulse_source_test");
        std::fs::create_dir_all(&dir).unwrap();
        write_snapshot(&dir, "iac_completo.csv", "anio,mes,venta_total\n2024,1,100.5\n");

        let service = CsvQueryService::new(&dir);
        let page = service.run_query(RETAIL_CONSUMPTION_QUERY).unwrap();

        assert_eq!(page.columns, vec!["anio", "mes", "venta_total"]);
        assert_eq!(page.len(), 1);
        assert_eq!(page.cell(0, 2), &Value::String("100.5".to_string()));
    }

    #[test]
    fn test_unregistered_query_is_an_error() {
        let dir = std::env::temp_dir().join("retail_pulse_source_test_unreg");
        std::fs::create_dir_all(&dir).unwrap();

        let service = CsvQueryService::new(&dir);
        assert!(service.run_query("SELECT 1").is_err());
    }

    #[test]
    fn test_connection_settings_from_secrets() {
        let secrets = Secrets {
            aws_access_key_id: "AKIA123".to_string(),
            aws_secret_access_key: "shh".to_string(),
            s3_staging_dir: "s3://staging/results/".to_string(),
            aws_region: "us-east-1".to_string(),
        };

        let settings = ConnectionSettings::from_secrets(&secrets);
        assert_eq!(settings.access_key_id, "AKIA123");
        assert_eq!(settings.staging_dir, "s3://staging/results/");
    }
}
