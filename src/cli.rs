//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::assembler::EmptyInputPolicy;
use clap::Parser;
use std::path::PathBuf;

/// survey-report - turn a survey CSV export into a categorized report
///
/// Groups questions into categories, tabulates response frequencies,
/// draws one bar chart per question and writes a Markdown or JSON document.
///
/// Examples:
///   survey-report --input responses.csv
///   survey-report --input responses.csv --format json --output report.json
///   survey-report --input exports/ --charts-dir figures
///   survey-report --input responses.csv --dry-run
///   survey-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Survey CSV file, or a directory of CSV files
    ///
    /// A directory produces one report per file, named after the file.
    #[arg(short, long, value_name = "PATH", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Default: from config or survey_report.md (survey_report.json with --format json).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for chart images, relative to the report
    #[arg(long, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .survey-report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Handling of questions present in the data but without any response
    #[arg(long, value_name = "POLICY")]
    pub empty_policy: Option<EmptyInputPolicy>,

    /// Fail if a registered question has no column in the input
    #[arg(long)]
    pub strict: bool,

    /// Number of charts rendered concurrently
    #[arg(long, value_name = "NUM", env = "SURVEY_REPORT_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Report title
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Dry run: show the report outline without rendering anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .survey-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for documents in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.exists() => {
                return Err(format!("Input does not exist: {}", input.display()));
            }
            Some(_) => {}
            None => return Err("--input is required".to_string()),
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err("Title must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a config file asking for verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from(".")),
            output: None,
            charts_dir: None,
            config: None,
            format: OutputFormat::Markdown,
            empty_policy: None,
            strict: false,
            concurrency: None,
            title: None,
            dry_run: false,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "survey-report",
            "--input",
            "responses.csv",
            "--format",
            "json",
            "--empty-policy",
            "skip",
            "--concurrency",
            "2",
            "--strict",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("responses.csv")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.empty_policy, Some(EmptyInputPolicy::Skip));
        assert_eq!(args.concurrency, Some(2));
        assert!(args.strict);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_input_required_unless_init_config() {
        assert!(Args::try_parse_from(["survey-report"]).is_err());
        let args = Args::try_parse_from(["survey-report", "--init-config"]).unwrap();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/nonexistent/responses.csv"));
        assert!(args.validate().is_err());

        args.input = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        args.concurrency = Some(1);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_merge_into_config() {
        let mut args = make_args();
        args.output = Some(PathBuf::from("out/report.md"));
        args.title = Some("Autumn Intake".to_string());
        args.empty_policy = Some(EmptyInputPolicy::Skip);
        args.strict = true;

        let mut config = crate::config::Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.general.output, "out/report.md");
        assert_eq!(config.report.title, "Autumn Intake");
        assert_eq!(config.general.empty_policy, EmptyInputPolicy::Skip);
        assert!(config.general.strict_schema);
        assert_eq!(config.general.concurrency, 4);
        assert_eq!(config.general.charts_dir, "charts");
    }
}
