// Exact-match subset selection and the selection lists the UI offers
// No partial or fuzzy matching; an empty result is valid output.

use crate::records::{BusinessSegmentRecord, SalesRecord};
use std::collections::{BTreeSet, HashSet};

/// Retail subset for one (year, month) pair.
pub fn filter_sales(records: &[SalesRecord], year: i32, month: u32) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| r.year == year && r.month == month)
        .cloned()
        .collect()
}

/// Segment subset for one (fiscal year, region) pair.
pub fn filter_segments(
    records: &[BusinessSegmentRecord],
    fiscal_year: i32,
    region_id: &str,
) -> Vec<BusinessSegmentRecord> {
    records
        .iter()
        .filter(|r| r.fiscal_year == fiscal_year && r.region_id == region_id)
        .cloned()
        .collect()
}

// ============================================================================
// SELECTION LISTS
// ============================================================================

/// Distinct years, ascending.
pub fn distinct_years(records: &[SalesRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct months available within one year, ascending.
pub fn months_for_year(records: &[SalesRecord], year: i32) -> Vec<u32> {
    records
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct fiscal years, ascending.
pub fn distinct_fiscal_years(records: &[BusinessSegmentRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.fiscal_year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct region ids in first-appearance order, unsorted.
pub fn distinct_regions(records: &[BusinessSegmentRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut regions = Vec::new();

    for record in records {
        if seen.insert(record.region_id.clone()) {
            regions.push(record.region_id.clone());
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales(year: i32, month: u32) -> SalesRecord {
        SalesRecord::with_total(year, month, 1.0)
    }

    fn segment(fiscal_year: i32, region: &str) -> BusinessSegmentRecord {
        BusinessSegmentRecord::new(fiscal_year, region, "TRAMO_1", 1, 1, 1.0)
    }

    #[test]
    fn test_filter_sales_exact_match() {
        let records = vec![sales(2024, 1), sales(2024, 2), sales(2023, 1)];

        let subset = filter_sales(&records, 2024, 1);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].year, 2024);
        assert_eq!(subset[0].month, 1);
    }

    #[test]
    fn test_filter_sales_no_match_is_empty() {
        let records = vec![sales(2024, 1)];
        assert!(filter_sales(&records, 2020, 6).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![sales(2024, 1), sales(2024, 1), sales(2024, 2)];

        let once = filter_sales(&records, 2024, 1);
        let twice = filter_sales(&once, 2024, 1);
        assert_eq!(once, twice);

        let segments = vec![segment(2022, "13"), segment(2022, "05")];
        let s_once = filter_segments(&segments, 2022, "13");
        let s_twice = filter_segments(&s_once, 2022, "13");
        assert_eq!(s_once, s_twice);
    }

    #[test]
    fn test_distinct_years_sorted() {
        let records = vec![sales(2024, 1), sales(2022, 5), sales(2024, 3), sales(2023, 2)];
        assert_eq!(distinct_years(&records), vec![2022, 2023, 2024]);
    }

    #[test]
    fn test_months_for_year_sorted_and_scoped() {
        let records = vec![sales(2024, 3), sales(2024, 1), sales(2023, 7), sales(2024, 1)];
        assert_eq!(months_for_year(&records, 2024), vec![1, 3]);
        assert_eq!(months_for_year(&records, 2023), vec![7]);
        assert!(months_for_year(&records, 2020).is_empty());
    }

    #[test]
    fn test_distinct_regions_keeps_appearance_order() {
        let records = vec![
            segment(2022, "13"),
            segment(2022, "05"),
            segment(2022, "13"),
            segment(2022, "01"),
        ];

        assert_eq!(distinct_regions(&records), vec!["13", "05", "01"]);
    }

    #[test]
    fn test_distinct_fiscal_years_sorted() {
        let records = vec![segment(2023, "13"), segment(2021, "13"), segment(2022, "13")];
        assert_eq!(distinct_fiscal_years(&records), vec![2021, 2022, 2023]);
    }
}
