//! End-to-end report run.
//!
//! Load the dataset, assemble the report, render the charts and feed the
//! document sink. Assembly is sequential; chart rendering is the only
//! concurrent step and keeps section order.

use crate::assembler::Assembler;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::{ReportError, ReportResult};
use crate::layout::LayoutPolicy;
use crate::models::{
    ChartSpec, FrequencyTable, Report, ReportItem, ReportMetadata, ReportSummary, Section,
};
use crate::registry::CategoryRegistry;
use crate::render::{
    write_document, ChartRef, ChartRenderer, JsonSink, MarkdownSink, RenderSink,
    SvgChartRenderer,
};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Where one input's report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    pub input: PathBuf,
    pub document: PathBuf,
    pub charts_dir: PathBuf,
    /// Chart directory as linked from the document.
    pub charts_link: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub document: PathBuf,
    pub questions: usize,
    pub categories: usize,
    pub charts: usize,
    pub respondents: usize,
}

/// CSV files to process: the path itself, or every `*.csv` below a directory.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut inputs: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        anyhow::bail!("No CSV files found under {}", path.display());
    }
    Ok(inputs)
}

/// Resolve output locations.
///
/// A single input writes to `output` directly. In batch mode each input
/// gets `<stem>_report.<ext>` next to `output` and its own chart folder,
/// where the stem is the input's path below the common input directory
/// with separators replaced by `_`. Inputs that would share a stem are a
/// configuration error.
pub fn plan_targets(
    inputs: &[PathBuf],
    output: &Path,
    charts_dir: &str,
    format: OutputFormat,
) -> ReportResult<Vec<ReportTarget>> {
    let out_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let charts_base = out_dir.join(charts_dir);

    if inputs.len() == 1 {
        return Ok(vec![ReportTarget {
            input: inputs[0].clone(),
            document: output.to_path_buf(),
            charts_dir: charts_base,
            charts_link: charts_dir.to_string(),
        }]);
    }

    let root = common_root(inputs);
    let mut claimed: HashMap<String, &PathBuf> = HashMap::new();
    let mut targets = Vec::with_capacity(inputs.len());

    for input in inputs {
        let stem = batch_stem(input, &root);
        if let Some(first) = claimed.insert(stem.to_lowercase(), input) {
            return Err(ReportError::configuration(format!(
                "{} and {} would both write {}_report.{}",
                first.display(),
                input.display(),
                stem,
                format.extension()
            )));
        }
        targets.push(ReportTarget {
            input: input.clone(),
            document: out_dir.join(format!("{}_report.{}", stem, format.extension())),
            charts_dir: charts_base.join(&stem),
            charts_link: format!("{}/{}", charts_dir.trim_end_matches('/'), stem),
        });
    }
    Ok(targets)
}

/// Deepest directory containing every input.
fn common_root(inputs: &[PathBuf]) -> PathBuf {
    let mut root = inputs
        .first()
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    while !inputs.iter().all(|p| p.starts_with(&root)) {
        if !root.pop() {
            break;
        }
    }
    root
}

fn batch_stem(input: &Path, root: &Path) -> String {
    let relative = input.strip_prefix(root).unwrap_or(input).with_extension("");
    let stem = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .filter(|c| !c.is_empty() && c != "." && c != "/")
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "survey".to_string()
    } else {
        stem
    }
}

/// Generate one report.
pub async fn run_report(
    config: &Config,
    registry: &CategoryRegistry,
    target: &ReportTarget,
    format: OutputFormat,
    show_progress: bool,
) -> Result<RunOutcome> {
    let dataset = Dataset::from_path(&target.input)?;
    dataset.check_schema(registry, config.general.strict_schema)?;

    let report = build_report(config, registry, &dataset)?;
    let questions = report.metadata.questions_processed;
    info!(
        "Assembled {} questions in {} categories",
        questions, report.metadata.categories_rendered
    );

    std::fs::create_dir_all(&target.charts_dir).with_context(|| {
        format!(
            "Failed to create chart directory {}",
            target.charts_dir.display()
        )
    })?;
    if let Some(parent) = target.document.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(
        target.charts_dir.clone(),
        target.charts_link.clone(),
        config.layout.pixels_per_inch,
    ));

    let chart_count = report.sections().filter(|s| !s.is_placeholder()).count();
    let progress = show_progress.then(|| progress_bar(chart_count as u64));
    let charts = render_charts(
        &report,
        renderer,
        config.general.concurrency,
        progress.clone(),
    )
    .await?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut sink: Box<dyn RenderSink> = match format {
        OutputFormat::Markdown => Box::new(MarkdownSink::new(
            target.document.clone(),
            config.report.cell_max_chars,
        )),
        OutputFormat::Json => Box::new(JsonSink::new(target.document.clone())),
    };
    let document = write_document(&report, &charts, sink.as_mut())?;

    Ok(RunOutcome {
        document,
        questions,
        categories: report.metadata.categories_rendered,
        charts: charts.iter().filter(|c| c.is_some()).count(),
        respondents: dataset.respondents(),
    })
}

/// Assemble the report for a loaded dataset.
pub fn build_report(
    config: &Config,
    registry: &CategoryRegistry,
    dataset: &Dataset,
) -> ReportResult<Report> {
    let responses = dataset.responses(registry);
    let layout = LayoutPolicy::new(registry, &config.layout);
    let assembler = Assembler::new(
        registry,
        layout,
        config.report.table_rows,
        config.general.empty_policy,
    );
    let items = assembler.assemble(&responses)?;

    let questions_processed = items.iter().filter(|i| i.as_section().is_some()).count();
    let categories_rendered = items
        .iter()
        .filter(|i| matches!(i, ReportItem::CategoryHeading { .. }))
        .count();

    Ok(Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            subtitle: config.report.subtitle.clone(),
            source: dataset.source_name(),
            generated_at: Utc::now(),
            questions_processed,
            categories_rendered,
        },
        summary: ReportSummary {
            questions_in_input: dataset.question_columns(registry).len(),
            respondents: dataset.respondents(),
            categories: registry.overview(),
        },
        items,
    })
}

/// Owned inputs for one chart, so it can move to a blocking task.
struct ChartJob {
    question: String,
    label: String,
    table: FrequencyTable,
    spec: ChartSpec,
}

impl ChartJob {
    fn from_section(section: &Section) -> Option<Self> {
        Some(Self {
            question: section.question.id.clone(),
            label: section.question.label.clone(),
            table: section.frequencies.clone()?,
            spec: section.chart.clone()?,
        })
    }
}

/// Render every section's chart, at most `concurrency` at a time.
///
/// The result has one entry per section in section order, `None` for
/// placeholder sections. The first failure aborts the run.
pub async fn render_charts(
    report: &Report,
    renderer: Arc<dyn ChartRenderer>,
    concurrency: usize,
    progress: Option<ProgressBar>,
) -> ReportResult<Vec<Option<ChartRef>>> {
    let jobs: Vec<Option<ChartJob>> = report.sections().map(ChartJob::from_section).collect();
    debug!("Rendering {} charts", jobs.iter().flatten().count());

    stream::iter(jobs.into_iter().map(|job| {
        let renderer = Arc::clone(&renderer);
        let progress = progress.clone();
        async move {
            let Some(job) = job else {
                return Ok(None);
            };
            let question = job.question.clone();
            let chart = tokio::task::spawn_blocking(move || {
                renderer.render(&job.question, &job.label, &job.table, &job.spec)
            })
            .await
            .map_err(|e| ReportError::render(question, e))??;

            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok::<_, ReportError>(Some(chart))
        }
    }))
    .buffered(concurrency.max(1))
    .try_collect()
    .await
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} charts")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
