//! survey-report - categorized survey analysis reports
//!
//! A CLI tool that reads a survey CSV export, groups its questions into
//! categories and writes a Markdown or JSON report with one frequency
//! table, bar chart and insight line per question.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, configuration, render failure, etc.)

mod analysis;
mod assembler;
mod cli;
mod config;
mod dataset;
mod error;
mod layout;
mod models;
mod pipeline;
mod registry;
mod render;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::Dataset;
use models::ReportItem;
use pipeline::ReportTarget;
use registry::CategoryRegistry;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so its verbosity applies
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("survey-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match origin {
        ConfigOrigin::File(path) => info!("Loaded config from: {}", path.display()),
        ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
        ConfigOrigin::Fallback(e) => warn!("Failed to load config: {}", e),
    }

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report generation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .survey-report.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize categories, layout rules and report text.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let registry = CategoryRegistry::from_config(&config)?;
    info!(
        "Registry: {} categories, {} questions",
        registry.categories_in_order().len(),
        registry.question_count()
    );

    let input = args.input.clone().context("--input is required")?;
    let inputs = pipeline::collect_inputs(&input)?;
    let output = output_path(&args, &config);
    let targets =
        pipeline::plan_targets(&inputs, &output, &config.general.charts_dir, args.format)?;

    // Handle --dry-run: outline the report and exit
    if args.dry_run {
        return handle_dry_run(&config, &registry, &targets);
    }

    if targets.len() > 1 {
        println!("📂 Processing {} survey files", targets.len());
    }

    for target in &targets {
        println!("📥 Reading survey: {}", target.input.display());

        let outcome =
            pipeline::run_report(&config, &registry, target, args.format, !args.quiet).await?;

        println!("\n📊 Report Summary:");
        println!("   Respondents: {}", outcome.respondents);
        println!("   Questions: {}", outcome.questions);
        println!("   Categories: {}", outcome.categories);
        println!("   Charts: {} in {}", outcome.charts, target.charts_dir.display());
        println!("   Report saved to: {}", outcome.document.display());
    }

    println!("\n✅ Done in {:.1}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Report path: explicit, configured, or the default with the format's extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        path.with_extension(OutputFormat::Json.extension())
    } else {
        path
    }
}

/// Handle --dry-run: assemble each report and print its outline.
fn handle_dry_run(
    config: &Config,
    registry: &CategoryRegistry,
    targets: &[ReportTarget],
) -> Result<()> {
    println!("\n🔍 Dry run: assembling without rendering...\n");

    for target in targets {
        let dataset = Dataset::from_path(&target.input)?;
        dataset.check_schema(registry, config.general.strict_schema)?;
        let report = pipeline::build_report(config, registry, &dataset)?;

        println!(
            "   {} ({} respondents) -> {}",
            dataset.source().display(),
            dataset.respondents(),
            target.document.display()
        );
        for item in &report.items {
            match item {
                ReportItem::CategoryHeading {
                    name,
                    question_count,
                } => println!("\n     📁 {} ({})", name, question_count),
                ReportItem::Section(section) => match section.chart {
                    Some(ref chart) => println!(
                        "       {} [{} {:.0}x{:.0}]",
                        section.heading, chart.orientation, chart.width, chart.height
                    ),
                    None => println!("       {} [no data]", section.heading),
                },
                ReportItem::CategoryBoundary => {}
            }
        }
        println!(
            "\n   Total: {} questions in {} categories\n",
            report.metadata.questions_processed, report.metadata.categories_rendered
        );
    }

    println!("✅ Dry run complete. Nothing was written.");
    Ok(())
}

/// Where the configuration came from.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    /// The default file exists but could not be loaded.
    Fallback(anyhow::Error),
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            let origin = ConfigOrigin::File(PathBuf::from(DEFAULT_CONFIG_FILE));
            Ok((config, origin))
        }
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(e))),
    }
}
