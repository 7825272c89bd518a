// Retail Pulse - Core Library
// Analytic core of the retail consumption dashboard plus the object-store
// credential probe. Exposes all modules for the TUI, the API server, the
// probe binary, and tests.

pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod config;
pub mod filter;
pub mod probe;
pub mod records;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use aggregate::{
    category_totals, employees_by_segment, monthly_sales, sales_kpis, segment_summary,
    CategoryTotal, MonthlySales, SalesKpis, SegmentSummary,
};
pub use cache::QueryCache;
pub use clean::{clean_sales, clean_segments, CleanError, TypeConversionError};
pub use config::Secrets;
pub use filter::{
    distinct_fiscal_years, distinct_regions, distinct_years, filter_sales, filter_segments,
    months_for_year,
};
pub use probe::{classify_listing, report, ListingError, ProbeOutcome};
pub use records::{period_label, BusinessSegmentRecord, Category, SalesRecord};
pub use session::{DashboardSession, DashboardView, Selection};
pub use source::{
    load_csv_page, ConnectionSettings, CsvQueryService, QueryService, TablePage,
    BUSINESS_SEGMENT_QUERY, RETAIL_CONSUMPTION_QUERY,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
