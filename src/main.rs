// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use retail_pulse::{CsvQueryService, DashboardSession, QueryCache};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "summary" {
        // Console summary mode
        run_summary()?;
    } else {
        // Dashboard mode (default)
        run_ui_mode()?;
    }

    Ok(())
}

fn data_dir() -> PathBuf {
    env::var("RETAIL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn load_session(data_dir: &Path) -> Result<DashboardSession> {
    let service = CsvQueryService::new(data_dir);
    let mut cache = QueryCache::new();
    DashboardSession::load(&service, &mut cache)
}

fn run_summary() -> Result<()> {
    println!("📊 Retail Pulse - Console Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dir = data_dir();
    println!("\n📂 Loading snapshots from {:?}...", dir);

    let session = load_session(&dir)?;
    println!(
        "✓ Loaded {} sales rows, {} segment rows at {}",
        session.sales().len(),
        session.segments().len(),
        session.loaded_at().format("%Y-%m-%d %H:%M:%SZ")
    );

    let view = session.view();
    let selection = session.selection();

    if let (Some(year), Some(month)) = (selection.year, selection.month) {
        println!(
            "\n🛒 Consumption {}: ${:.0} across {} records",
            retail_pulse::period_label(year, month),
            view.kpis.total_sales,
            view.kpis.record_count
        );
        println!("   Top categories:");
        for total in view.categories.iter().take(3) {
            println!("   - {:<22} {:.0}", total.category.label(), total.total);
        }
    } else {
        println!("\n🛒 Consumption table is empty");
    }

    if let (Some(fiscal_year), Some(region)) = (selection.fiscal_year, &selection.region_id) {
        println!(
            "\n🏢 Region {} / {}: {} businesses, {} workers, {:.2} UF",
            region,
            fiscal_year,
            view.segment_summary.num_businesses,
            view.segment_summary.num_employees,
            view.segment_summary.sales_uf
        );
    } else {
        println!("\n🏢 Segment table is empty");
    }

    println!("\n✅ Summary complete");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Loading Retail Pulse dashboard...\n");

    let dir = data_dir();

    if !dir.exists() {
        eprintln!("❌ Data directory not found: {:?}", dir);
        eprintln!("   Place the warehouse snapshots there:");
        eprintln!("   - iac_completo.csv");
        eprintln!("   - empresas_tramos_clean.csv");
        eprintln!("   Or point RETAIL_DATA_DIR at them.");
        std::process::exit(1);
    }

    println!("📊 Loading snapshots...");
    let session = load_session(&dir)?;
    println!(
        "✓ Loaded {} sales rows, {} segment rows\n",
        session.sales().len(),
        session.segments().len()
    );
    println!("Starting dashboard... (Press 'q' to quit)\n");

    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ Dashboard mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin retail-server --features server");
    std::process::exit(1);
}
