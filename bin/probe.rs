// Retail Pulse - Object Store Credential Probe
// One listing call against the object store, one classified outcome on
// stdout. Always exits 0; the outcome is the report itself.

use retail_pulse::config::{Secrets, DEFAULT_SECRETS_FILE};
use std::path::Path;

#[tokio::main]
async fn main() {
    env_logger::init();

    // Export file-based secrets so the SDK's default chain resolves them
    match Secrets::discover(Path::new(DEFAULT_SECRETS_FILE)) {
        Ok(Some(secrets)) => secrets.apply_to_env(),
        Ok(None) => {}
        Err(e) => eprintln!("⚠️  Ignoring unreadable secrets file: {}", e),
    }

    let outcome = retail_pulse::probe::run_probe().await;
    retail_pulse::probe::report(&outcome);
}
