mod analysis;
mod catalog;
mod propagation;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use catalog::{save_records, TwoLineElement};
use web::Config;

#[derive(Parser)]
#[command(name = "conjunction-watch")]
#[command(about = "Satellite conjunction analysis service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
    /// Fetch the reference catalog from CelesTrak and persist it
    FetchCatalog {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
    /// Validate a TLE file (name line plus two element lines)
    Validate { tle_file: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::FetchCatalog { config } => fetch_catalog(&config).await,
        Commands::Validate { tle_file } => validate(&tle_file),
    }
}

async fn serve(config_path: &str) -> ExitCode {
    let config = match Config::load_or_default(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn fetch_catalog(config_path: &str) -> ExitCode {
    let config = match Config::load_or_default(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let records = match catalog::fetch::fetch_catalog().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Catalog fetch failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = save_records(&config.data.catalog, &records) {
        eprintln!("Error writing {}: {}", config.data.catalog.display(), e);
        return ExitCode::FAILURE;
    }

    println!(
        "Saved {} catalog entries to {}",
        records.len(),
        config.data.catalog.display()
    );
    ExitCode::SUCCESS
}

fn validate(path: &str) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let (name, line1, line2) = match lines.as_slice() {
        [l1, l2] => (None, *l1, *l2),
        [name, l1, l2] => (Some(*name), *l1, *l2),
        _ => {
            eprintln!(
                "Expected 2 or 3 non-empty lines (optional name plus two element lines), got {}",
                lines.len()
            );
            return ExitCode::FAILURE;
        }
    };

    let tle = match TwoLineElement::new(line1, line2) {
        Ok(tle) => tle,
        Err(e) => {
            eprintln!("Invalid TLE: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let elements = match tle.elements() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Invalid TLE: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("TLE is valid");
    println!("  name:         {}", name.unwrap_or("(none)"));
    println!("  norad id:     {}", elements.norad_id);
    println!("  epoch:        {}", elements.datetime);
    println!("  inclination:  {:.4} deg", elements.inclination);
    println!("  eccentricity: {:.7}", elements.eccentricity);
    println!("  mean motion:  {:.8} rev/day", elements.mean_motion);
    ExitCode::SUCCESS
}
