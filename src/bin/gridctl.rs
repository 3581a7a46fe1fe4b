use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use grid_optimizer::config::{Config, StorageBackend};
use grid_optimizer::controller::AppState;
use grid_optimizer::domain::OptimizationRecord;
use grid_optimizer::{ingest, telemetry};

#[derive(Parser)]
#[command(name = "gridctl", version, about = "Grid optimization command line")]
struct Cli {
    /// Load the demo sample set before running the command
    #[arg(long, global = true)]
    seed: bool,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize one or more regions (default: the configured region)
    Optimize { regions: Vec<String> },
    /// Show the last optimization for a region
    Status { region: Option<String> },
    /// Import samples from a CSV file with region,demand,supply,timestamp columns
    Import { path: PathBuf },
    /// Load the demo sample set
    Seed,
    /// Optimize every catalog region and report how many succeeded
    TestRegions,
    /// Run a free-text command
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List the region catalog
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    cfg.log.json = false;
    telemetry::init_tracing(&cfg.log);

    let persistent = cfg.db.backend != StorageBackend::Memory;
    let state = AppState::new(cfg).await?;
    if cli.seed {
        ingest::seed(state.engine.states()).await?;
    }

    match cli.command {
        Commands::Optimize { regions } => {
            let regions = if regions.is_empty() {
                vec![state.cfg.grid.default_region.clone()]
            } else {
                regions
            };
            let mut failed = 0;
            for region in &regions {
                match state.engine.optimize(Some(region)).await {
                    Ok(record) => print_record(&record, cli.json)?,
                    Err(e) => {
                        eprintln!("{}: {}", region, e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} regions failed", failed, regions.len());
            }
        }
        Commands::Status { region } => {
            let region = region.unwrap_or_else(|| state.cfg.grid.default_region.clone());
            let record = state.engine.latest_result(Some(&region)).await?;
            print_record(&record, cli.json)?;
        }
        Commands::Import { path } => {
            let samples = ingest::read_samples_from_path(&path)?;
            let report = state.engine.states().record_batch(samples).await?;
            println!(
                "imported {} samples from {} ({} rejected)",
                report.accepted,
                path.display(),
                report.rejected
            );
            warn_if_transient(persistent);
        }
        Commands::Seed => {
            if !cli.seed {
                let report = ingest::seed(state.engine.states()).await?;
                println!("added {} demo samples", report.accepted);
            }
            warn_if_transient(persistent);
        }
        Commands::TestRegions => {
            let regions: Vec<String> = state.regions.names().map(str::to_string).collect();
            let mut ok = 0;
            for region in &regions {
                match state.engine.optimize(Some(region)).await {
                    Ok(_) => {
                        println!("{}: ok", region);
                        ok += 1;
                    }
                    Err(e) => println!("{}: {}", region, e),
                }
            }
            println!("{}/{} regions optimized", ok, regions.len());
            if ok < regions.len() {
                std::process::exit(1);
            }
        }
        Commands::Ask { text } => {
            let reply = state.commands.execute(&text.join(" ")).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.text);
            }
            if !reply.success {
                std::process::exit(1);
            }
        }
        Commands::Regions => {
            let regions = state.regions.list_regions();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(regions)?);
            } else {
                for region in regions {
                    println!("{:<12} {:<12} {}", region.name, region.display_name, region.status);
                }
            }
        }
    }
    Ok(())
}

fn print_record(record: &OptimizationRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    println!("region:           {}", record.region);
    println!("optimized supply: {:.2} MW", record.optimized_supply);
    println!("optimized demand: {:.2} MW", record.optimized_demand);
    println!("losses:           {:.8} MW^2", record.losses);
    if let Some(efficiency) = record.efficiency_percent() {
        println!("efficiency:       {:.6}%", efficiency);
    }
    println!(
        "computed at:      {} ({}, {} iterations)",
        record.computed_at.to_rfc3339(),
        record.algorithm,
        record.iterations
    );
    Ok(())
}

fn warn_if_transient(persistent: bool) {
    if !persistent {
        eprintln!("note: in-memory storage, samples last only for this process");
    }
}
