//! Sheetflow CLI Entry Point
//!
//! Runs an append action against a local JSON workbook.
//!
//! # Usage
//!
//! ```bash
//! # Append rows described by an action file
//! sheetflow append.yaml
//!
//! # Use a specific workbook file
//! sheetflow append.yaml --workbook data/book.json
//!
//! # Dry run mode (preview the range write)
//! sheetflow append.yaml --dry-run
//!
//! # Print the stage timeline afterwards
//! sheetflow append.yaml --timeline
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};
use serde_json::json;

use sheetflow::action::load_action;
use sheetflow::execution::Engine;
use sheetflow::service::LocalWorkbook;
use sheetflow::{APP_NAME, VERSION};

/// Default action file used when none is specified.
const DEFAULT_ACTION: &str = "action.yaml";

/// Default workbook file.
const DEFAULT_WORKBOOK: &str = "workbook.json";

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    action_path: String,
    workbook_path: String,
    dry_run: bool,
    show_timeline: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            action_path: DEFAULT_ACTION.to_string(),
            workbook_path: DEFAULT_WORKBOOK.to_string(),
            dry_run: false,
            show_timeline: false,
            verbose: false,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("Spreadsheet Append Actions");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: sheetflow [OPTIONS] <ACTION_FILE>");
    println!();
    println!("Arguments:");
    println!("  <ACTION_FILE>       Path to action YAML file (default: {})", DEFAULT_ACTION);
    println!();
    println!("Options:");
    println!("  --workbook PATH     Local JSON workbook (default: {})", DEFAULT_WORKBOOK);
    println!("  --dry-run           Compose the write without performing it");
    println!("  --timeline          Print the stage timeline after the run");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  sheetflow append.yaml");
    println!("  sheetflow append.yaml --dry-run");
    println!("  sheetflow append.yaml --workbook data/book.json --timeline");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--timeline" => {
                config.show_timeline = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--workbook" => {
                i += 1;
                if i >= args.len() {
                    return Err("--workbook requires a path argument".to_string());
                }
                config.workbook_path = args[i].clone();
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if positional_index > 0 {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.action_path = arg.clone();
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Main application entry point.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    print_banner();

    if config.dry_run {
        info!("Mode: DRY RUN (nothing will be written)");
        println!();
    }

    info!("Loading action: {}", config.action_path);
    let definition = load_action(&config.action_path).map_err(|e| {
        error!("Failed to load action: {}", e);
        format!("Could not load action from '{}': {}", config.action_path, e)
    })?;

    let workbook = LocalWorkbook::open(&config.workbook_path);
    info!("Workbook: {}", workbook.path().display());

    let mut engine = Engine::new(definition);
    engine.set_dry_run(config.dry_run);

    let result = engine.run(&workbook).await;

    if config.show_timeline {
        if let Some(timeline) = engine.timeline() {
            println!("{}", timeline.chart());
        }
    }

    let outcome = result?;

    println!();
    let status = if outcome.dry_run {
        "Would append".yellow()
    } else {
        "Appended".green()
    };
    println!(
        "{} {} row(s) to {}",
        status.bold(),
        outcome.rows_written,
        outcome.range
    );

    let report = json!({
        "action": outcome.action.to_string(),
        "range": outcome.range.to_string(),
        "rowsWritten": outcome.rows_written,
        "dryRun": outcome.dry_run,
        "finishedAt": outcome.finished_at.to_rfc3339(),
        "output": outcome.output,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
