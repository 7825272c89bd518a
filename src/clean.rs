// Row cleaners for the two warehouse snapshots
// Retail rows: lenient on the sales amount, strict on the period keys.
// Segment rows: strict on every numeric field.

use crate::records::{BusinessSegmentRecord, Category, SalesRecord};
use crate::source::TablePage;
use log::{debug, warn};
use serde_json::Value;
use std::fmt;

pub const COL_YEAR: &str = "anio";
pub const COL_MONTH: &str = "mes";
pub const COL_TOTAL_SALES: &str = "venta_total";

pub const COL_FISCAL_YEAR: &str = "anio_comercial";
pub const COL_REGION: &str = "id_region";
pub const COL_SEGMENT: &str = "id_tramo";
pub const COL_NUM_BUSINESSES: &str = "num_empresas";
pub const COL_NUM_EMPLOYEES: &str = "num_trabajadores_dependientes";
pub const COL_SALES_UF: &str = "ventas_uf";

// ============================================================================
// ERRORS
// ============================================================================

/// A cell that must be integer- or decimal-representable but is not.
/// Fatal at fetch time; the caller surfaces it, no recovery is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeConversionError {
    pub column: String,
    pub row: usize,
    pub value: String,
}

impl fmt::Display for TypeConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column `{}`, row {}: value {:?} is not numeric",
            self.column, self.row, self.value
        )
    }
}

impl std::error::Error for TypeConversionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanError {
    /// The snapshot is missing a column the record type requires.
    MissingColumn { column: String },
    TypeConversion(TypeConversionError),
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanError::MissingColumn { column } => {
                write!(f, "snapshot is missing required column `{}`", column)
            }
            CleanError::TypeConversion(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CleanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CleanError::TypeConversion(err) => Some(err),
            CleanError::MissingColumn { .. } => None,
        }
    }
}

impl From<TypeConversionError> for CleanError {
    fn from(err: TypeConversionError) -> Self {
        CleanError::TypeConversion(err)
    }
}

// ============================================================================
// CELL PARSING
// ============================================================================

/// Render a cell for error messages.
fn cell_repr(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decimal reading of a cell. Strings are trimmed; empty and non-numeric
/// cells read as `None`.
fn parse_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Integer reading of a cell. A decimal with a fractional part does not
/// count as integer-representable.
fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    }
}

/// String reading of a cell: region and segment ids arrive as either
/// strings or bare numbers.
fn parse_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_column(page: &TablePage, name: &str) -> Result<usize, CleanError> {
    page.column_index(name).ok_or(CleanError::MissingColumn {
        column: name.to_string(),
    })
}

fn required_int(page: &TablePage, row: usize, col: usize, name: &str) -> Result<i64, CleanError> {
    parse_int(page.cell(row, col)).ok_or_else(|| {
        CleanError::TypeConversion(TypeConversionError {
            column: name.to_string(),
            row,
            value: cell_repr(page.cell(row, col)),
        })
    })
}

fn required_decimal(page: &TablePage, row: usize, col: usize, name: &str) -> Result<f64, CleanError> {
    parse_decimal(page.cell(row, col)).ok_or_else(|| {
        CleanError::TypeConversion(TypeConversionError {
            column: name.to_string(),
            row,
            value: cell_repr(page.cell(row, col)),
        })
    })
}

// ============================================================================
// RETAIL CLEANER
// ============================================================================

/// Clean the retail consumption snapshot.
///
/// Rows whose `venta_total` does not parse numerically are silently dropped
/// (row-level data-quality failure). Non-integer year/month cells fail the
/// whole fetch. Category amounts read leniently, defaulting to zero. Row
/// order is preserved and `periodo` is derived per retained row.
pub fn clean_sales(page: &TablePage) -> Result<Vec<SalesRecord>, CleanError> {
    let year_col = required_column(page, COL_YEAR)?;
    let month_col = required_column(page, COL_MONTH)?;
    let total_col = required_column(page, COL_TOTAL_SALES)?;

    let category_cols: Vec<(Category, Option<usize>)> = Category::ALL
        .iter()
        .map(|c| (*c, page.column_index(c.column())))
        .collect();

    let mut records = Vec::with_capacity(page.len());
    let mut dropped = 0usize;

    for row in 0..page.len() {
        let total_sales = match parse_decimal(page.cell(row, total_col)) {
            Some(v) => v,
            None => {
                dropped += 1;
                continue;
            }
        };

        let year = required_int(page, row, year_col, COL_YEAR)? as i32;
        let month = required_int(page, row, month_col, COL_MONTH)? as u32;

        if !(1..=12).contains(&month) {
            warn!("row {}: month {} outside 1-12, keeping row", row, month);
        }

        let mut record = SalesRecord::with_total(year, month, total_sales);
        for (category, col) in &category_cols {
            if let Some(col) = col {
                record.set_category_amount(
                    *category,
                    parse_decimal(page.cell(row, *col)).unwrap_or(0.0),
                );
            }
        }

        records.push(record);
    }

    if dropped > 0 {
        debug!(
            "dropped {} of {} retail rows with non-numeric {}",
            dropped,
            page.len(),
            COL_TOTAL_SALES
        );
    }

    Ok(records)
}

// ============================================================================
// SEGMENT CLEANER
// ============================================================================

/// Clean the firm/employment segment snapshot. Every numeric field is
/// required; there is no lenient drop path for this dataset.
pub fn clean_segments(page: &TablePage) -> Result<Vec<BusinessSegmentRecord>, CleanError> {
    let year_col = required_column(page, COL_FISCAL_YEAR)?;
    let region_col = required_column(page, COL_REGION)?;
    let segment_col = required_column(page, COL_SEGMENT)?;
    let businesses_col = required_column(page, COL_NUM_BUSINESSES)?;
    let employees_col = required_column(page, COL_NUM_EMPLOYEES)?;
    let sales_col = required_column(page, COL_SALES_UF)?;

    let mut records = Vec::with_capacity(page.len());

    for row in 0..page.len() {
        let fiscal_year = required_int(page, row, year_col, COL_FISCAL_YEAR)? as i32;

        let region_id = parse_key(page.cell(row, region_col)).ok_or_else(|| {
            CleanError::TypeConversion(TypeConversionError {
                column: COL_REGION.to_string(),
                row,
                value: cell_repr(page.cell(row, region_col)),
            })
        })?;

        let segment_id = parse_key(page.cell(row, segment_col)).unwrap_or_default();

        let num_businesses = required_int(page, row, businesses_col, COL_NUM_BUSINESSES)?;
        let num_employees = required_int(page, row, employees_col, COL_NUM_EMPLOYEES)?;
        let sales_uf = required_decimal(page, row, sales_col, COL_SALES_UF)?;

        if num_businesses < 0 || num_employees < 0 {
            warn!(
                "row {}: negative count (empresas={}, trabajadores={})",
                row, num_businesses, num_employees
            );
        }

        records.push(BusinessSegmentRecord {
            fiscal_year,
            region_id,
            segment_id,
            num_businesses,
            num_employees,
            sales_uf,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sales_page(rows: Vec<Vec<Value>>) -> TablePage {
        TablePage::new(
            vec![
                COL_YEAR.to_string(),
                COL_MONTH.to_string(),
                COL_TOTAL_SALES.to_string(),
                "combustible".to_string(),
                "alimentos".to_string(),
            ],
            rows,
        )
    }

    fn segment_page(rows: Vec<Vec<Value>>) -> TablePage {
        TablePage::new(
            vec![
                COL_FISCAL_YEAR.to_string(),
                COL_REGION.to_string(),
                COL_SEGMENT.to_string(),
                COL_NUM_BUSINESSES.to_string(),
                COL_NUM_EMPLOYEES.to_string(),
                COL_SALES_UF.to_string(),
            ],
            rows,
        )
    }

    #[test]
    fn test_clean_drops_non_numeric_sales() {
        let page = sales_page(vec![
            vec![json!("2024"), json!("1"), json!("100.5"), json!("40"), json!("60.5")],
            vec![json!("2024"), json!("1"), json!("bad"), json!("1"), json!("2")],
        ]);

        let records = clean_sales(&page).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_sales, 100.5);
        assert_eq!(records[0].fuel, 40.0);
        assert_eq!(records[0].food, 60.5);
        assert_eq!(records[0].period, "2024-01");
    }

    #[test]
    fn test_clean_never_grows_and_keeps_numeric_rows_only() {
        let page = sales_page(vec![
            vec![json!("2024"), json!("1"), json!("10"), json!("0"), json!("0")],
            vec![json!("2024"), json!("2"), json!(""), json!("0"), json!("0")],
            vec![json!("2024"), json!("3"), json!("x"), json!("0"), json!("0")],
            vec![json!("2024"), json!("4"), json!("30.25"), json!("0"), json!("0")],
        ]);

        let records = clean_sales(&page).unwrap();

        assert!(records.len() <= page.len());
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.total_sales.is_finite()));
        // Order preserved
        assert_eq!(records[0].month, 1);
        assert_eq!(records[1].month, 4);
    }

    #[test]
    fn test_clean_period_is_zero_padded() {
        let page = sales_page(vec![vec![
            json!("2024"),
            json!("3"),
            json!("5"),
            json!("0"),
            json!("0"),
        ]]);

        let records = clean_sales(&page).unwrap();
        assert_eq!(records[0].period, "2024-03");
    }

    #[test]
    fn test_clean_fails_on_non_integer_month() {
        let page = sales_page(vec![vec![
            json!("2024"),
            json!("enero"),
            json!("5"),
            json!("0"),
            json!("0"),
        ]]);

        let err = clean_sales(&page).unwrap_err();
        match err {
            CleanError::TypeConversion(conv) => {
                assert_eq!(conv.column, COL_MONTH);
                assert_eq!(conv.row, 0);
                assert_eq!(conv.value, "enero");
            }
            other => panic!("expected type conversion error, got {}", other),
        }
    }

    #[test]
    fn test_clean_fails_on_fractional_year() {
        let page = sales_page(vec![vec![
            json!("2024.5"),
            json!("1"),
            json!("5"),
            json!("0"),
            json!("0"),
        ]]);

        assert!(matches!(
            clean_sales(&page),
            Err(CleanError::TypeConversion(_))
        ));
    }

    #[test]
    fn test_clean_accepts_integral_float_year() {
        // Warehouse exports sometimes widen ints to floats
        let page = sales_page(vec![vec![
            json!(2024.0),
            json!(1),
            json!(5.0),
            json!(0),
            json!(0),
        ]]);

        let records = clean_sales(&page).unwrap();
        assert_eq!(records[0].year, 2024);
        assert_eq!(records[0].month, 1);
    }

    #[test]
    fn test_clean_missing_column() {
        let page = TablePage::new(
            vec![COL_YEAR.to_string(), COL_MONTH.to_string()],
            vec![],
        );

        assert_eq!(
            clean_sales(&page).unwrap_err(),
            CleanError::MissingColumn {
                column: COL_TOTAL_SALES.to_string()
            }
        );
    }

    #[test]
    fn test_missing_category_column_defaults_to_zero() {
        let page = TablePage::new(
            vec![
                COL_YEAR.to_string(),
                COL_MONTH.to_string(),
                COL_TOTAL_SALES.to_string(),
            ],
            vec![vec![json!("2024"), json!("1"), json!("9.5")]],
        );

        let records = clean_sales(&page).unwrap();
        assert_eq!(records[0].fuel, 0.0);
        assert_eq!(records[0].auto_parts, 0.0);
    }

    #[test]
    fn test_clean_segments() {
        let page = segment_page(vec![vec![
            json!("2022"),
            json!(13),
            json!("TRAMO_3"),
            json!("120"),
            json!("4500"),
            json!("98765.4321"),
        ]]);

        let records = clean_segments(&page).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fiscal_year, 2022);
        assert_eq!(records[0].region_id, "13");
        assert_eq!(records[0].segment_id, "TRAMO_3");
        assert_eq!(records[0].num_businesses, 120);
        assert_eq!(records[0].num_employees, 4500);
        assert_eq!(records[0].sales_uf, 98765.4321);
    }

    #[test]
    fn test_clean_segments_strict_on_measures() {
        let page = segment_page(vec![vec![
            json!("2022"),
            json!("13"),
            json!("TRAMO_1"),
            json!("n/a"),
            json!("4500"),
            json!("1.0"),
        ]]);

        let err = clean_segments(&page).unwrap_err();
        match err {
            CleanError::TypeConversion(conv) => assert_eq!(conv.column, COL_NUM_BUSINESSES),
            other => panic!("expected type conversion error, got {}", other),
        }
    }
}
