//! Markdown document sink.
//!
//! Builds the report as a single Markdown file: title block, executive
//! summary, category overview, then one section per question with its
//! frequency table, chart image and key insights.

use super::{truncate_cell, ChartRef, RenderSink};
use crate::error::{ReportError, ReportResult};
use crate::models::{FrequencyRow, ReportMetadata, ReportSummary};
use std::path::PathBuf;
use tracing::info;

/// Page break understood by most Markdown-to-print pipelines.
const PAGE_BREAK: &str = "<div style=\"page-break-after: always\"></div>\n\n";

/// Accumulates Markdown and writes it on `finalize`.
pub struct MarkdownSink {
    path: PathBuf,
    cell_max_chars: usize,
    output: String,
}

impl MarkdownSink {
    pub fn new(path: PathBuf, cell_max_chars: usize) -> Self {
        Self {
            path,
            cell_max_chars,
            output: String::new(),
        }
    }

    /// The document built so far.
    pub fn contents(&self) -> &str {
        &self.output
    }
}

impl RenderSink for MarkdownSink {
    fn begin_document(&mut self, metadata: &ReportMetadata) -> ReportResult<()> {
        self.output.push_str(&format!("# {}\n\n", metadata.title));
        if !metadata.subtitle.is_empty() {
            self.output.push_str(&format!("*{}*\n\n", metadata.subtitle));
        }
        self.output.push_str(&generate_metadata_section(metadata));
        Ok(())
    }

    fn add_summary(&mut self, summary: &ReportSummary) -> ReportResult<()> {
        self.output.push_str(&generate_summary_section(summary));
        self.output.push_str(PAGE_BREAK);
        self.output.push_str(&generate_overview_section(summary));
        Ok(())
    }

    fn add_category_heading(&mut self, name: &str, question_count: usize) -> ReportResult<()> {
        self.output.push_str(&format!("## {}\n\n", name));
        let noun = if question_count == 1 { "question" } else { "questions" };
        self.output
            .push_str(&format!("*{} {} in this section*\n\n", question_count, noun));
        Ok(())
    }

    fn add_question_section(
        &mut self,
        _number: usize,
        heading: &str,
        table: &[FrequencyRow],
        chart: Option<&ChartRef>,
        insights: &[String],
    ) -> ReportResult<()> {
        self.output.push_str(&format!("### {}\n\n", heading));

        if !table.is_empty() {
            self.output
                .push_str(&generate_table(table, self.cell_max_chars));
        }

        if let Some(chart) = chart {
            self.output
                .push_str(&format!("![{}]({})\n\n", escape_cell(heading), chart.link));
        }

        if !insights.is_empty() {
            self.output
                .push_str(&format!("**Key Insights:** {}\n\n", insights.join(" • ")));
        }

        Ok(())
    }

    fn add_page_break(&mut self) -> ReportResult<()> {
        self.output.push_str(PAGE_BREAK);
        Ok(())
    }

    fn finalize(&mut self) -> ReportResult<PathBuf> {
        self.output.push_str(&generate_footer());

        std::fs::write(&self.path, &self.output)
            .map_err(|e| ReportError::render(self.path.display().to_string(), e))?;
        info!("Wrote Markdown report to {}", self.path.display());

        Ok(self.path.clone())
    }
}

/// Generate the report details block.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Report Details\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Questions Analyzed:** {}\n",
        metadata.questions_processed
    ));
    section.push_str(&format!(
        "- **Categories:** {}\n\n",
        metadata.categories_rendered
    ));

    section
}

/// Generate the executive summary section.
fn generate_summary_section(summary: &ReportSummary) -> String {
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str(&format!(
        "This report analyzes {} questions across {} key areas, based on responses from {} participants.\n\n",
        summary.questions_in_input,
        summary.categories.len(),
        summary.respondents
    ));
    section.push_str(
        "Each question is presented with a frequency table of its most common responses, \
         a chart of the full distribution and a short list of key insights.\n\n",
    );

    section
}

/// Generate the category overview list.
fn generate_overview_section(summary: &ReportSummary) -> String {
    let mut section = String::new();

    section.push_str("## Survey Categories Overview\n\n");
    for (i, category) in summary.categories.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** ({} questions)\n",
            i + 1,
            category.name,
            category.question_count
        ));
    }
    section.push('\n');

    section
}

/// Generate a frequency table.
fn generate_table(rows: &[FrequencyRow], cell_max_chars: usize) -> String {
    let mut table = String::new();

    table.push_str("| Response | Count | Percentage |\n");
    table.push_str("|:---|:---:|:---:|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            escape_cell(&truncate_cell(&row.value, cell_max_chars)),
            row.count,
            row.percentage
        ));
    }
    table.push('\n');

    table
}

/// Keep a value on one table row.
fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by survey-report v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}
