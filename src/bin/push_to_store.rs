// Push the prepared species table and range GeoJSON into the store
//
// Usage: cargo run --bin push_to_store
// Paths come from SPECIESWATCH_DB, SPECIES_DATA_FILE and SPECIES_GEO_FILE.

use species_watch::loader::push_all;
use species_watch::{Config, SpeciesStore};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "species_watch=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let start = Instant::now();

    println!("{}", "=".repeat(70));
    println!("Pushing data to {}", config.db_path);
    println!("{}", "=".repeat(70));
    println!("  Species table: {}", config.species_data_file.display());
    println!("  Range file:    {}", config.species_geo_file.display());

    let report = push_all(
        || SpeciesStore::open(&config.db_path),
        &config.species_data_file,
        &config.species_geo_file,
    );

    println!();
    match report.species_rows {
        Some(rows) => println!("  species_data: {} rows", rows),
        None => println!("  species_data: FAILED (see log)"),
    }
    match report.geo_rows {
        Some(rows) => println!("  species_geo:  {} rows", rows),
        None => println!("  species_geo:  FAILED (see log)"),
    }
    println!("\nTotal time: {:.3} s", start.elapsed().as_secs_f64());

    if !report.is_success() {
        anyhow::bail!("One or more pushes failed");
    }
    Ok(())
}
