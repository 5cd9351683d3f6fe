#![cfg(not(tarpaulin_include))]

use checktable::app;
use std::env;

/// Main entry point for the web application
///
/// Serves the checklist table on the given address, backed by the given CSV
/// file. Both arguments are optional:
///
/// `website [addr] [csv-path]` (defaults: `127.0.0.1:3000`, `data/data.csv`)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let addr = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let csv_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "data/data.csv".to_string());

    app::run(&addr, csv_path.into()).await
}
