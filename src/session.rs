// Dashboard session: owns the fetched tables and drives the pipeline
// Every selection change recomputes filter → aggregate over the in-memory
// snapshots; there is no incremental update and no shared state across
// sessions.

use crate::aggregate::{
    category_totals, employees_by_segment, monthly_sales, sales_kpis, segment_summary,
    CategoryTotal, MonthlySales, SalesKpis, SegmentSummary,
};
use crate::cache::QueryCache;
use crate::clean::{clean_sales, clean_segments};
use crate::filter::{
    distinct_fiscal_years, distinct_regions, distinct_years, filter_sales, filter_segments,
    months_for_year,
};
use crate::records::{BusinessSegmentRecord, SalesRecord};
use crate::source::{QueryService, BUSINESS_SEGMENT_QUERY, RETAIL_CONSUMPTION_QUERY};
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

/// Current user selections, one per dashboard dimension. `None` only when
/// the corresponding dataset is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub fiscal_year: Option<i32>,
    pub region_id: Option<String>,
}

/// Everything the presentation layer consumes for one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub kpis: SalesKpis,
    pub monthly: Vec<MonthlySales>,
    pub categories: Vec<CategoryTotal>,
    pub filtered_sales: Vec<SalesRecord>,
    pub segment_summary: SegmentSummary,
    pub segment_employees: Vec<(String, i64)>,
    pub filtered_segments: Vec<BusinessSegmentRecord>,
}

/// One user session: an independent copy of both cleaned tables plus the
/// current selections.
pub struct DashboardSession {
    pub id: String,
    sales: Vec<SalesRecord>,
    segments: Vec<BusinessSegmentRecord>,
    selection: Selection,
    loaded_at: DateTime<Utc>,
}

impl DashboardSession {
    /// Fetch both snapshots through the cache, clean them, and default the
    /// selections to the first entry of each selection list.
    pub fn load(service: &dyn QueryService, cache: &mut QueryCache) -> Result<Self> {
        let (sales, segments) = fetch_tables(service, cache)?;

        let mut session = DashboardSession {
            id: uuid::Uuid::new_v4().to_string(),
            sales,
            segments,
            selection: Selection::default(),
            loaded_at: Utc::now(),
        };
        session.reset_selection();

        info!(
            "session {} loaded: {} sales rows, {} segment rows",
            session.id,
            session.sales.len(),
            session.segments.len()
        );

        Ok(session)
    }

    /// Invalidate both cached queries and replace the tables wholesale.
    pub fn refresh(&mut self, service: &dyn QueryService, cache: &mut QueryCache) -> Result<()> {
        cache.invalidate(RETAIL_CONSUMPTION_QUERY);
        cache.invalidate(BUSINESS_SEGMENT_QUERY);

        let (sales, segments) = fetch_tables(service, cache)?;
        self.sales = sales;
        self.segments = segments;
        self.loaded_at = Utc::now();
        self.revalidate_selection();

        info!(
            "session {} refreshed: {} sales rows, {} segment rows",
            self.id,
            self.sales.len(),
            self.segments.len()
        );

        Ok(())
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn sales(&self) -> &[SalesRecord] {
        &self.sales
    }

    pub fn segments(&self) -> &[BusinessSegmentRecord] {
        &self.segments
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ========================================================================
    // SELECTION LISTS
    // ========================================================================

    pub fn years(&self) -> Vec<i32> {
        distinct_years(&self.sales)
    }

    /// Months available for the currently selected year.
    pub fn months(&self) -> Vec<u32> {
        match self.selection.year {
            Some(year) => months_for_year(&self.sales, year),
            None => Vec::new(),
        }
    }

    pub fn fiscal_years(&self) -> Vec<i32> {
        distinct_fiscal_years(&self.segments)
    }

    pub fn regions(&self) -> Vec<String> {
        distinct_regions(&self.segments)
    }

    // ========================================================================
    // SELECTION MUTATORS
    // ========================================================================

    /// Select a year. Rejects values outside the selection list; clamps the
    /// month to the first available one when the year no longer offers it.
    pub fn select_year(&mut self, year: i32) -> bool {
        if !self.years().contains(&year) {
            return false;
        }

        self.selection.year = Some(year);
        let months = months_for_year(&self.sales, year);
        match self.selection.month {
            Some(month) if months.contains(&month) => {}
            _ => self.selection.month = months.first().copied(),
        }
        true
    }

    /// Select a month within the currently selected year.
    pub fn select_month(&mut self, month: u32) -> bool {
        if !self.months().contains(&month) {
            return false;
        }
        self.selection.month = Some(month);
        true
    }

    pub fn select_fiscal_year(&mut self, fiscal_year: i32) -> bool {
        if !self.fiscal_years().contains(&fiscal_year) {
            return false;
        }
        self.selection.fiscal_year = Some(fiscal_year);
        true
    }

    pub fn select_region(&mut self, region_id: &str) -> bool {
        if !self.regions().iter().any(|r| r == region_id) {
            return false;
        }
        self.selection.region_id = Some(region_id.to_string());
        true
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Run the full filter → aggregate pipeline for the current selections.
    pub fn view(&self) -> DashboardView {
        let filtered_sales = match (self.selection.year, self.selection.month) {
            (Some(year), Some(month)) => filter_sales(&self.sales, year, month),
            _ => Vec::new(),
        };

        let filtered_segments = match (&self.selection.fiscal_year, &self.selection.region_id) {
            (Some(fiscal_year), Some(region_id)) => {
                filter_segments(&self.segments, *fiscal_year, region_id)
            }
            _ => Vec::new(),
        };

        DashboardView {
            kpis: sales_kpis(&filtered_sales),
            monthly: monthly_sales(&self.sales),
            categories: category_totals(&filtered_sales),
            segment_summary: segment_summary(&filtered_segments),
            segment_employees: employees_by_segment(&filtered_segments),
            filtered_sales,
            filtered_segments,
        }
    }

    fn reset_selection(&mut self) {
        self.selection = Selection::default();
        if let Some(year) = self.years().first().copied() {
            self.select_year(year);
        }
        if let Some(fiscal_year) = self.fiscal_years().first().copied() {
            self.selection.fiscal_year = Some(fiscal_year);
        }
        self.selection.region_id = self.regions().first().cloned();
    }

    /// After a refresh, keep selections that still exist and re-default the
    /// rest.
    fn revalidate_selection(&mut self) {
        let previous = self.selection.clone();
        self.reset_selection();

        if let Some(year) = previous.year {
            if self.select_year(year) {
                if let Some(month) = previous.month {
                    self.select_month(month);
                }
            }
        }
        if let Some(fiscal_year) = previous.fiscal_year {
            self.select_fiscal_year(fiscal_year);
        }
        if let Some(region_id) = previous.region_id {
            self.select_region(&region_id);
        }
    }
}

fn fetch_tables(
    service: &dyn QueryService,
    cache: &mut QueryCache,
) -> Result<(Vec<SalesRecord>, Vec<BusinessSegmentRecord>)> {
    let retail_page = cache.fetch(service, RETAIL_CONSUMPTION_QUERY)?;
    let segment_page = cache.fetch(service, BUSINESS_SEGMENT_QUERY)?;

    let sales = clean_sales(&retail_page)?;
    let segments = clean_segments(&segment_page)?;

    Ok((sales, segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TablePage;
    use serde_json::{json, Value};

    /// Serves fixed pages for the two dashboard queries.
    struct FixedService {
        retail: TablePage,
        segments: TablePage,
    }

    impl QueryService for FixedService {
        fn run_query(&self, sql: &str) -> Result<TablePage> {
            if sql == RETAIL_CONSUMPTION_QUERY {
                Ok(self.retail.clone())
            } else if sql == BUSINESS_SEGMENT_QUERY {
                Ok(self.segments.clone())
            } else {
                anyhow::bail!("unexpected query: {}", sql)
            }
        }
    }

    fn retail_row(year: i32, month: u32, total: &str, fuel: f64, food: f64) -> Vec<Value> {
        vec![json!(year.to_string()), json!(month.to_string()), json!(total), json!(fuel), json!(food)]
    }

    fn fixture() -> FixedService {
        FixedService {
            retail: TablePage::new(
                vec![
                    "anio".to_string(),
                    "mes".to_string(),
                    "venta_total".to_string(),
                    "combustible".to_string(),
                    "alimentos".to_string(),
                ],
                vec![
                    retail_row(2023, 11, "80.0", 30.0, 50.0),
                    retail_row(2023, 12, "120.0", 60.0, 60.0),
                    retail_row(2024, 1, "100.5", 40.0, 60.5),
                    retail_row(2024, 1, "bad", 0.0, 0.0),
                ],
            ),
            segments: TablePage::new(
                vec![
                    "anio_comercial".to_string(),
                    "id_region".to_string(),
                    "id_tramo".to_string(),
                    "num_empresas".to_string(),
                    "num_trabajadores_dependientes".to_string(),
                    "ventas_uf".to_string(),
                ],
                vec![
                    vec![json!("2022"), json!("13"), json!("T1"), json!("10"), json!("100"), json!("50.5")],
                    vec![json!("2022"), json!("13"), json!("T2"), json!("5"), json!("40"), json!("9.5")],
                    vec![json!("2022"), json!("05"), json!("T1"), json!("2"), json!("7"), json!("1.0")],
                ],
            ),
        }
    }

    fn loaded_session() -> DashboardSession {
        let service = fixture();
        let mut cache = QueryCache::new();
        DashboardSession::load(&service, &mut cache).unwrap()
    }

    #[test]
    fn test_load_defaults_to_first_selections() {
        let session = loaded_session();

        assert_eq!(session.selection().year, Some(2023));
        assert_eq!(session.selection().month, Some(11));
        assert_eq!(session.selection().fiscal_year, Some(2022));
        assert_eq!(session.selection().region_id, Some("13".to_string()));
        // The bad-total row was dropped during cleaning
        assert_eq!(session.sales().len(), 3);
    }

    #[test]
    fn test_select_year_clamps_month() {
        let mut session = loaded_session();

        assert!(session.select_year(2024));
        // November is not available in 2024, clamp to the first month
        assert_eq!(session.selection().month, Some(1));
    }

    #[test]
    fn test_mutators_reject_values_outside_selection_lists() {
        let mut session = loaded_session();

        assert!(!session.select_year(1999));
        assert!(!session.select_month(6));
        assert!(!session.select_fiscal_year(2030));
        assert!(!session.select_region("99"));
        // Selection untouched by rejected updates
        assert_eq!(session.selection().year, Some(2023));
    }

    #[test]
    fn test_view_recomputes_per_selection() {
        let mut session = loaded_session();
        session.select_year(2024);

        let view = session.view();

        assert_eq!(view.kpis.record_count, 1);
        assert_eq!(view.kpis.total_sales, 100.5);
        assert_eq!(view.monthly.len(), 3);
        assert_eq!(view.monthly[0].period, "2023-11");
        assert_eq!(view.categories[0].total, 60.5); // food leads
        assert_eq!(view.filtered_sales.len(), 1);

        assert_eq!(view.segment_summary.num_businesses, 15);
        assert_eq!(view.segment_summary.num_employees, 140);
        assert_eq!(view.segment_employees, vec![("T1".to_string(), 100), ("T2".to_string(), 40)]);
    }

    #[test]
    fn test_view_with_region_change() {
        let mut session = loaded_session();
        assert!(session.select_region("05"));

        let view = session.view();
        assert_eq!(view.segment_summary.num_businesses, 2);
        assert_eq!(view.filtered_segments.len(), 1);
    }

    #[test]
    fn test_refresh_replaces_tables_and_keeps_valid_selection() {
        let service = fixture();
        let mut cache = QueryCache::new();
        let mut session = DashboardSession::load(&service, &mut cache).unwrap();
        session.select_year(2024);

        session.refresh(&service, &mut cache).unwrap();

        assert_eq!(session.selection().year, Some(2024));
        assert_eq!(session.sales().len(), 3);
    }

    #[test]
    fn test_empty_datasets_leave_selection_unset() {
        let service = FixedService {
            retail: TablePage::new(
                vec!["anio".to_string(), "mes".to_string(), "venta_total".to_string()],
                vec![],
            ),
            segments: TablePage::new(
                vec![
                    "anio_comercial".to_string(),
                    "id_region".to_string(),
                    "id_tramo".to_string(),
                    "num_empresas".to_string(),
                    "num_trabajadores_dependientes".to_string(),
                    "ventas_uf".to_string(),
                ],
                vec![],
            ),
        };
        let mut cache = QueryCache::new();

        let session = DashboardSession::load(&service, &mut cache).unwrap();
        assert_eq!(session.selection(), &Selection::default());

        let view = session.view();
        assert_eq!(view.kpis.record_count, 0);
        assert!(view.monthly.is_empty());
        assert_eq!(view.categories.len(), 9);
    }
}
