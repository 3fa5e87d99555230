// Enrich historical species status data with labels and change flags
//
// Usage: cargo run --bin preprocess_history -- [INPUT] [OUTPUT]
// Defaults: historical_species_data.parquet -> species_data_clean.parquet

use anyhow::Result;
use species_watch::preprocess::preprocess_file;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_INPUT: &str = "historical_species_data.parquet";
const DEFAULT_OUTPUT: &str = "species_data_clean.parquet";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "species_watch=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string()));
    let output = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));

    println!("{}", "=".repeat(70));
    println!("Preprocessing species history");
    println!("{}", "=".repeat(70));
    println!("  Input:  {}", input.display());
    println!("  Output: {}", output.display());

    let start = Instant::now();
    let rows = preprocess_file(&input, &output)?;

    println!("\n  Written: {} rows ({:.3} ms)", rows, start.elapsed().as_secs_f64() * 1000.0);
    println!("{}", "=".repeat(70));
    Ok(())
}
