//! Energy-site simulator entry point — CLI wiring and feed construction.

use std::path::Path;
use std::process;

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use ems_sim::config::SiteConfig;
use ems_sim::io::export::export_csv;
use ems_sim::sim::{LiveFeed, SnapshotGenerator};

/// Days of history generated when `--export` is given without `--history`.
const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    ticks: u32,
    history_days: Option<u32>,
    export_path: Option<String>,
}

fn print_help() {
    eprintln!("ems-sim — Home energy management system simulator");
    eprintln!();
    eprintln!("Usage: ems-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>    Load site config from TOML file");
    eprintln!("  --preset <name>    Use a built-in preset (baseline, equatorial)");
    eprintln!("  --seed <u64>       Override random seed");
    eprintln!("  --ticks <n>        Number of live snapshots to print (default: 1)");
    eprintln!("  --history <days>   Print a daily history series instead of live snapshots");
    eprintln!("  --export <path>    Write the history series to CSV");
    eprintln!("  --help             Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        ticks: 1,
        history_days: None,
        export_path: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--ticks" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --ticks requires a count argument");
                    process::exit(1);
                }
                if let Ok(n) = args[i].parse::<u32>() {
                    cli.ticks = n;
                } else {
                    eprintln!("error: --ticks value \"{}\" is not a valid count", args[i]);
                    process::exit(1);
                }
            }
            "--history" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --history requires a day count argument");
                    process::exit(1);
                }
                if let Ok(d) = args[i].parse::<u32>() {
                    cli.history_days = Some(d);
                } else {
                    eprintln!("error: --history value \"{}\" is not a valid day count", args[i]);
                    process::exit(1);
                }
            }
            "--export" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --export requires a path argument");
                    process::exit(1);
                }
                cli.export_path = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline default
    let mut site = if let Some(ref path) = cli.config_path {
        match SiteConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match SiteConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        SiteConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        site.simulation.seed = seed;
    }

    let errors = site.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if cli.history_days.is_some() || cli.export_path.is_some() {
        let days = cli.history_days.unwrap_or(DEFAULT_HISTORY_DAYS).max(1);
        let end = Utc::now().date_naive();
        let start = end - Duration::days(i64::from(days) - 1);

        let mut generator = SnapshotGenerator::new(&site);
        let records = generator.daily_series(start, end);

        for r in &records {
            println!("{r}");
        }

        if let Some(ref path) = cli.export_path {
            if let Err(e) = export_csv(&records, Path::new(path)) {
                eprintln!("error: failed to write CSV: {e}");
                process::exit(1);
            }
            eprintln!("History written to {path}");
        }
        return;
    }

    let mut feed = LiveFeed::new(&site);
    println!("{}", feed.current());
    for _ in 1..cli.ticks {
        println!("{}", feed.tick());
    }
}
