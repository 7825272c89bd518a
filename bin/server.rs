// Retail Pulse - JSON API Server
// Read-only endpoints; every request recomputes filter + aggregation over
// the immutable in-memory tables.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use retail_pulse::{
    category_totals, distinct_fiscal_years, distinct_regions, distinct_years, employees_by_segment,
    filter_sales, filter_segments, monthly_sales, months_for_year, sales_kpis, segment_summary,
    BusinessSegmentRecord, CategoryTotal, CsvQueryService, MonthlySales, QueryCache, SalesKpis,
    SalesRecord, SegmentSummary, BUSINESS_SEGMENT_QUERY, RETAIL_CONSUMPTION_QUERY,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state: one immutable copy of both cleaned tables.
#[derive(Clone)]
struct AppState {
    sales: Arc<Vec<SalesRecord>>,
    segments: Arc<Vec<BusinessSegmentRecord>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Retail summary for one (year, month) selection.
#[derive(Serialize)]
struct RetailSummaryResponse {
    year: i32,
    month: u32,
    period: String,
    kpis: SalesKpis,
    categories: Vec<CategoryTotal>,
}

/// Segment summary for one (fiscal year, region) selection.
#[derive(Serialize)]
struct SegmentSummaryResponse {
    fiscal_year: i32,
    region_id: String,
    summary: SegmentSummary,
    employees_by_segment: Vec<(String, i64)>,
    records: Vec<BusinessSegmentRecord>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/retail/years - Years with retail data, ascending
async fn get_years(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(distinct_years(&state.sales)))
}

/// GET /api/retail/months/:year - Months available within a year
async fn get_months(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(months_for_year(&state.sales, year)))
}

/// GET /api/retail/monthly - Monthly sales evolution over the whole table
async fn get_monthly(State(state): State<AppState>) -> impl IntoResponse {
    let monthly: Vec<MonthlySales> = monthly_sales(&state.sales);
    Json(ApiResponse::ok(monthly))
}

/// GET /api/retail/summary/:year/:month - KPIs + category ranking
async fn get_retail_summary(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> impl IntoResponse {
    let subset = filter_sales(&state.sales, year, month);

    Json(ApiResponse::ok(RetailSummaryResponse {
        year,
        month,
        period: retail_pulse::period_label(year, month),
        kpis: sales_kpis(&subset),
        categories: category_totals(&subset),
    }))
}

/// GET /api/retail/records/:year/:month - The filtered subset itself
async fn get_retail_records(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(filter_sales(&state.sales, year, month)))
}

/// GET /api/segments/years - Fiscal years, ascending
async fn get_fiscal_years(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(distinct_fiscal_years(&state.segments)))
}

/// GET /api/segments/regions - Region ids in appearance order
async fn get_regions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(distinct_regions(&state.segments)))
}

/// GET /api/segments/summary/:year/:region - Segment KPIs + chart data
async fn get_segment_summary(
    State(state): State<AppState>,
    Path((fiscal_year, region_id)): Path<(i32, String)>,
) -> impl IntoResponse {
    let subset = filter_segments(&state.segments, fiscal_year, &region_id);

    Json(ApiResponse::ok(SegmentSummaryResponse {
        fiscal_year,
        region_id,
        summary: segment_summary(&subset),
        employees_by_segment: employees_by_segment(&subset),
        records: subset,
    }))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    env_logger::init();

    println!("🌐 Retail Pulse - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data_dir = std::env::var("RETAIL_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let data_dir = std::path::Path::new(&data_dir);

    if !data_dir.exists() {
        eprintln!("❌ Data directory not found: {:?}", data_dir);
        eprintln!("   Place the warehouse snapshots there, or set RETAIL_DATA_DIR.");
        std::process::exit(1);
    }

    // Fetch and clean both tables once; requests recompute over them
    let service = CsvQueryService::new(data_dir);
    let mut cache = QueryCache::new();

    let retail_page = match cache.fetch(&service, RETAIL_CONSUMPTION_QUERY) {
        Ok(page) => page,
        Err(e) => {
            eprintln!("❌ Failed to fetch retail snapshot: {}", e);
            std::process::exit(1);
        }
    };
    let segment_page = match cache.fetch(&service, BUSINESS_SEGMENT_QUERY) {
        Ok(page) => page,
        Err(e) => {
            eprintln!("❌ Failed to fetch segment snapshot: {}", e);
            std::process::exit(1);
        }
    };

    let sales = match retail_pulse::clean_sales(&retail_page) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("❌ Retail snapshot failed cleaning: {}", e);
            std::process::exit(1);
        }
    };
    let segments = match retail_pulse::clean_segments(&segment_page) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("❌ Segment snapshot failed cleaning: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Loaded {} sales rows, {} segment rows", sales.len(), segments.len());

    let state = AppState {
        sales: Arc::new(sales),
        segments: Arc::new(segments),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/retail/years", get(get_years))
        .route("/retail/months/:year", get(get_months))
        .route("/retail/monthly", get(get_monthly))
        .route("/retail/summary/:year/:month", get(get_retail_summary))
        .route("/retail/records/:year/:month", get(get_retail_records))
        .route("/segments/years", get(get_fiscal_years))
        .route("/segments/regions", get(get_regions))
        .route("/segments/summary/:year/:region", get(get_segment_summary))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Try: http://localhost:3000/api/retail/monthly");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
