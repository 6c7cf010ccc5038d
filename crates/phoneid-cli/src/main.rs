//! phoneid - resolve a device identifier to a device profile
//!
//! Thin driver over the resolution engine: load configuration, resolve
//! one identifier, print the result. The web and GUI frontends consume
//! the same engine through `phoneid-lookup`.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use phoneid_core::{ResolutionSource, TacRegistry};
use phoneid_lookup::{LookupConfig, Resolver};

#[derive(Parser, Debug)]
#[command(name = "phoneid")]
#[command(about = "Resolve a 15-digit device identifier to a device profile")]
#[command(version)]
struct Args {
    /// The 15-digit identifier to resolve
    #[arg(required_unless_present = "init_config")]
    imei: Option<String>,

    /// Path to lookup configuration file
    #[arg(short, long, default_value = "phoneid.toml")]
    config: PathBuf,

    /// Path to a TAC table overriding the built-in registry
    #[arg(long)]
    tac_table: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Write a starter configuration to the --config path and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.init_config {
        phoneid_lookup::save_default_config(&args.config)?;
        println!("Wrote starter configuration to {}", args.config.display());
        return Ok(());
    }

    let registry = match &args.tac_table {
        Some(path) => TacRegistry::from_file(path)?,
        None => TacRegistry::builtin(),
    };
    info!(entries = registry.len(), "TAC registry ready");

    let config = LookupConfig::load(&args.config)?;
    let resolver = Resolver::from_config(registry, &config);

    let imei = args.imei.expect("clap enforces the identifier argument");
    let result = resolver.resolve(&imei).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_human(result: &phoneid_core::ResolutionResult) {
    match (&result.descriptor, &result.error_reason) {
        (Some(descriptor), _) => {
            println!("Source:       {}", result.source.tag());
            if result.source == ResolutionSource::Synthetic {
                println!("              (unverified - synthesized, not confirmed by any source)");
            }
            println!("Manufacturer: {}", descriptor.manufacturer);
            println!("Model:        {}", descriptor.model);
            if !descriptor.storage.is_empty() {
                println!("Storage:      {}", descriptor.storage.join(", "));
            }
            if let Some(color) = &descriptor.color {
                println!("Color:        {color}");
            }
            if let Some(os) = &descriptor.os_family {
                println!("OS:           {os}");
            }
            if let Some(year) = descriptor.release_year {
                println!("Released:     {year}");
            }
            if let Some(chipset) = &descriptor.chipset {
                println!("Chipset:      {chipset}");
            }
            if let Some(lock) = &descriptor.sim_lock {
                println!("SIM lock:     {lock}");
            }
            if let Some(activation) = &descriptor.activation_lock {
                println!("Activation:   {activation}");
            }
            if let Some(warranty) = &descriptor.warranty {
                println!("Warranty:     {warranty}");
            }
            if let Some(blacklist) = &descriptor.blacklist {
                println!("Blacklist:    {blacklist}");
            }
        }
        (None, Some(reason)) => {
            eprintln!("Rejected: {reason}");
        }
        (None, None) => {
            eprintln!("Rejected");
        }
    }
}
