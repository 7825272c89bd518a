// Pure reductions over the cleaned tables
// Never fail on well-typed input; empty results are valid output.

use crate::records::{period_label, BusinessSegmentRecord, Category, SalesRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// TEMPORAL AGGREGATION
// ============================================================================

/// Total sales for one distinct (year, month) bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub period: String,
    pub total_sales: f64,
}

/// Group by (year, month) and sum `total_sales`. One row per distinct
/// period, ascending by (year, month), period label recomputed per group.
/// Order-independent in its input.
pub fn monthly_sales(records: &[SalesRecord]) -> Vec<MonthlySales> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for record in records {
        *buckets.entry((record.year, record.month)).or_insert(0.0) += record.total_sales;
    }

    buckets
        .into_iter()
        .map(|((year, month), total_sales)| MonthlySales {
            year,
            month,
            period: period_label(year, month),
            total_sales,
        })
        .collect()
}

// ============================================================================
// CATEGORY AGGREGATION
// ============================================================================

/// Summed amount for one category over a filtered subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Sum each of the nine category fields over an already-filtered subset,
/// ranked by total descending. Ties keep declaration order (stable sort).
/// An empty subset yields all nine categories with total zero, in
/// declaration order.
pub fn category_totals(subset: &[SalesRecord]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Category::ALL
        .iter()
        .map(|category| CategoryTotal {
            category: *category,
            total: subset.iter().map(|r| r.category_amount(*category)).sum(),
        })
        .collect();

    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

// ============================================================================
// KPI SUMMARIES
// ============================================================================

/// The two retail KPI tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesKpis {
    pub total_sales: f64,
    pub record_count: usize,
}

pub fn sales_kpis(subset: &[SalesRecord]) -> SalesKpis {
    SalesKpis {
        total_sales: subset.iter().map(|r| r.total_sales).sum(),
        record_count: subset.len(),
    }
}

/// The three segment KPI tiles. `sales_uf` stays unrounded here; display
/// rounding belongs to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub num_businesses: i64,
    pub num_employees: i64,
    pub sales_uf: f64,
}

pub fn segment_summary(subset: &[BusinessSegmentRecord]) -> SegmentSummary {
    SegmentSummary {
        num_businesses: subset.iter().map(|r| r.num_businesses).sum(),
        num_employees: subset.iter().map(|r| r.num_employees).sum(),
        sales_uf: subset.iter().map(|r| r.sales_uf).sum(),
    }
}

/// Employee totals per business-size segment, in first-appearance order.
/// Feeds the workers-by-segment bar chart.
pub fn employees_by_segment(subset: &[BusinessSegmentRecord]) -> Vec<(String, i64)> {
    let mut order: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in subset {
        match index.get(&record.segment_id) {
            Some(&i) => order[i].1 += record.num_employees,
            None => {
                index.insert(record.segment_id.clone(), order.len());
                order.push((record.segment_id.clone(), record.num_employees));
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: u32, total: f64) -> SalesRecord {
        SalesRecord::with_total(year, month, total)
    }

    #[test]
    fn test_monthly_sales_groups_and_sorts() {
        let records = vec![
            record(2024, 2, 150.0),
            record(2024, 1, 60.0),
            record(2024, 2, 50.0),
            record(2024, 1, 40.0),
        ];

        let monthly = monthly_sales(&records);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-01");
        assert_eq!(monthly[0].total_sales, 100.0);
        assert_eq!(monthly[1].period, "2024-02");
        assert_eq!(monthly[1].total_sales, 200.0);
    }

    #[test]
    fn test_monthly_sales_is_order_independent() {
        let mut records = vec![
            record(2023, 12, 10.0),
            record(2024, 1, 20.0),
            record(2023, 12, 30.0),
        ];

        let forward = monthly_sales(&records);
        records.reverse();
        let backward = monthly_sales(&records);

        assert_eq!(forward, backward);
        // Ascending across a year boundary
        assert_eq!(forward[0].period, "2023-12");
        assert_eq!(forward[1].period, "2024-01");
    }

    #[test]
    fn test_monthly_sales_empty_input() {
        assert!(monthly_sales(&[]).is_empty());
    }

    #[test]
    fn test_category_totals_ranked_descending() {
        let mut a = record(2024, 1, 100.0);
        a.fuel = 40.0;
        a.food = 60.0;
        let mut b = record(2024, 1, 30.0);
        b.food = 25.0;
        b.auto_parts = 5.0;

        let totals = category_totals(&[a, b]);

        assert_eq!(totals[0].category, Category::Food);
        assert_eq!(totals[0].total, 85.0);
        assert_eq!(totals[1].category, Category::Fuel);
        assert_eq!(totals[1].total, 40.0);
        assert_eq!(totals[2].category, Category::AutoParts);
    }

    #[test]
    fn test_category_totals_empty_subset_keeps_declaration_order() {
        let totals = category_totals(&[]);

        assert_eq!(totals.len(), 9);
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(totals[i].category, *category);
            assert_eq!(totals[i].total, 0.0);
        }
    }

    #[test]
    fn test_category_ties_keep_declaration_order() {
        let mut a = record(2024, 1, 10.0);
        a.food = 5.0;
        a.fuel = 5.0;
        a.auto_parts = 5.0;

        let totals = category_totals(&[a]);

        // All tied at 5.0 ahead of the zero categories; declaration order wins
        assert_eq!(totals[0].category, Category::Fuel);
        assert_eq!(totals[1].category, Category::Food);
        assert_eq!(totals[2].category, Category::AutoParts);
    }

    #[test]
    fn test_sales_kpis() {
        let kpis = sales_kpis(&[record(2024, 1, 100.5), record(2024, 1, 9.5)]);
        assert_eq!(kpis.total_sales, 110.0);
        assert_eq!(kpis.record_count, 2);
    }

    #[test]
    fn test_segment_summary_sums_measures() {
        let subset = vec![
            BusinessSegmentRecord::new(2022, "13", "TRAMO_1", 100, 2000, 1500.25),
            BusinessSegmentRecord::new(2022, "13", "TRAMO_2", 50, 1000, 499.75),
        ];

        let summary = segment_summary(&subset);
        assert_eq!(summary.num_businesses, 150);
        assert_eq!(summary.num_employees, 3000);
        assert_eq!(summary.sales_uf, 2000.0);
    }

    #[test]
    fn test_employees_by_segment_appearance_order() {
        let subset = vec![
            BusinessSegmentRecord::new(2022, "13", "TRAMO_2", 1, 10, 0.0),
            BusinessSegmentRecord::new(2022, "13", "TRAMO_1", 1, 20, 0.0),
            BusinessSegmentRecord::new(2022, "13", "TRAMO_2", 1, 5, 0.0),
        ];

        let chart = employees_by_segment(&subset);
        assert_eq!(
            chart,
            vec![("TRAMO_2".to_string(), 15), ("TRAMO_1".to_string(), 20)]
        );
    }

    #[test]
    fn test_empty_segment_subset() {
        assert_eq!(segment_summary(&[]).num_employees, 0);
        assert!(employees_by_segment(&[]).is_empty());
    }
}
