//! Callback Drop Analyzer CLI Application
//!
//! Command-line report assembly around the callback-drop-analyzer library:
//! - Loads a JSON trace dump
//! - Merges config.toml settings with command-line overrides
//! - Runs the dropped-messages summary and/or per-callback duration reports
//! - Writes the result as text tables or JSON

use anyhow::{Context, Result};
use callback_drop_analyzer::{Analyzer, InMemoryTrace};
use clap::Parser;
use std::path::PathBuf;

mod config;
mod output;

use config::{AppConfig, OutputFormat, ReportKind};
use output::ReportBundle;

/// Callback Drop Analyzer - estimate dropped messages from callback traces
#[derive(Parser, Debug)]
#[command(name = "callback-drop-cli")]
#[command(about = "Estimate dropped messages and callback durations from a trace dump", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the JSON trace dump
    #[arg(short, long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Callback whose rate stands in for callbacks without a period entry
    #[arg(long, value_name = "NAME")]
    reference: Option<String>,

    /// Observed count above which a callback is treated as message-triggered
    #[arg(long, value_name = "COUNT")]
    threshold: Option<usize>,

    /// Number of duration histogram bins
    #[arg(long, value_name = "COUNT")]
    bins: Option<usize>,

    /// Additional owner-info marker to exclude (can be repeated)
    #[arg(long, value_name = "MARKER")]
    exclude: Vec<String>,

    /// Which report(s) to produce
    #[arg(short, long, value_enum)]
    report: Option<ReportKind>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Callback Drop Analyzer CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using analyzer library v{}", callback_drop_analyzer::VERSION);

    let config = resolve_config(&args)?;
    run(&config)
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(trace) = &args.trace {
        config.input.trace = Some(trace.clone());
    }
    if let Some(reference) = &args.reference {
        config.analyzer.reference_callback = reference.clone();
    }
    if let Some(threshold) = args.threshold {
        config.analyzer.downstream_count_threshold = threshold;
    }
    if let Some(bins) = args.bins {
        config.analyzer.histogram_bins = bins;
    }
    config
        .analyzer
        .excluded_markers
        .extend(args.exclude.iter().cloned());
    if let Some(report) = args.report {
        config.output.report = report;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Run the selected reports and write them out
fn run(config: &AppConfig) -> Result<()> {
    let trace_path = config
        .input
        .trace
        .as_ref()
        .context("No trace specified (use --trace or [input] trace in the config file)")?;

    let trace = InMemoryTrace::from_json_file(trace_path)
        .with_context(|| format!("Failed to load trace dump: {:?}", trace_path))?;
    let analyzer = Analyzer::new(config.analyzer.clone())?;

    let report = config.output.report;
    let bundle = ReportBundle {
        summary: report
            .includes_summary()
            .then(|| analyzer.summary(&trace))
            .transpose()?,
        individual: report
            .includes_individual()
            .then(|| analyzer.individual(&trace))
            .transpose()?,
    };

    let rendered = match config.output.format {
        OutputFormat::Txt => bundle.to_txt()?,
        OutputFormat::Json => bundle.to_json()?,
    };

    match &config.output.path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
