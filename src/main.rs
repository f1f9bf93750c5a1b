use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use symptom_tracker::analyzer::{CommandOptions, SymptomAnalyzer};
use symptom_tracker::{config, logging};
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "symptom-tracker")]
#[command(about = "Track daily symptom measurements and report trends")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import records from files, directories, glob patterns or stdin (-)
    Import {
        /// Inputs to read
        #[arg(required = true, value_name = "PATH|GLOB|-")]
        inputs: Vec<String>,
        /// Replace stored records instead of appending
        #[arg(long)]
        replace: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show consolidated statistics
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the clinical report
    Report,
    /// Show correlations between daily aggregates
    Correlations {
        /// Comma-separated variable names (e.g. anxiety,tension,dose)
        #[arg(long, value_delimiter = ',')]
        vars: Option<Vec<String>>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show a day x time-of-day heatmap of one metric
    Heatmap {
        /// Metric name (e.g. anxiety, brain_fog)
        #[arg(long, default_value = "anxiety")]
        metric: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Export stored records as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show record count and date range
    Summary {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Delete all stored records
    Clear,
}

impl Commands {
    fn into_parts(self) -> (&'static str, CommandOptions) {
        match self {
            Commands::Import { inputs, replace, json } => (
                "import",
                CommandOptions {
                    json_output: json,
                    inputs,
                    replace,
                    ..CommandOptions::default()
                },
            ),
            Commands::Stats { json } => (
                "stats",
                CommandOptions {
                    json_output: json,
                    ..CommandOptions::default()
                },
            ),
            Commands::Report => ("report", CommandOptions::default()),
            Commands::Correlations { vars, json } => (
                "correlations",
                CommandOptions {
                    json_output: json,
                    variables: vars,
                    ..CommandOptions::default()
                },
            ),
            Commands::Heatmap { metric, json } => (
                "heatmap",
                CommandOptions {
                    json_output: json,
                    metric: Some(metric),
                    ..CommandOptions::default()
                },
            ),
            Commands::Export { output } => (
                "export",
                CommandOptions {
                    output,
                    ..CommandOptions::default()
                },
            ),
            Commands::Summary { json } => (
                "summary",
                CommandOptions {
                    json_output: json,
                    ..CommandOptions::default()
                },
            ),
            Commands::Clear => ("clear", CommandOptions::default()),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (command, options) = cli.command.unwrap_or(Commands::Report).into_parts();
    let json = options.json_output;

    if let Err(e) = config::init_config() {
        handle_error(e, json);
    }
    let _log_guard = logging::init_logging();

    let analyzer = SymptomAnalyzer::new();
    let result = analyzer
        .run_command(command, options)
        .instrument(logging::run_span(command))
        .await;

    if let Err(e) = result {
        handle_error(e, json);
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
