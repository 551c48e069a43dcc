//! Rendering collaborators.
//!
//! The assembler's item stream is materialized through two narrow
//! interfaces: a [`ChartRenderer`] producing one image per section and a
//! [`RenderSink`] producing the document. Concrete backends live in the
//! submodules.

pub mod chart;
pub mod json;
pub mod markdown;

pub use chart::SvgChartRenderer;
pub use json::JsonSink;
pub use markdown::MarkdownSink;

use crate::error::{ReportError, ReportResult};
use crate::models::{
    ChartSpec, FrequencyRow, FrequencyTable, Report, ReportItem, ReportMetadata, ReportSummary,
};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Reference to a rendered chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    /// Where the image was written.
    pub path: PathBuf,
    /// How the document should link to it.
    pub link: String,
}

/// Draws one question's chart.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, question: &str, label: &str, table: &FrequencyTable, spec: &ChartSpec)
        -> ReportResult<ChartRef>;
}

/// Receives the document structure in order and writes it out.
pub trait RenderSink {
    /// Title block plus source and generation details.
    fn begin_document(&mut self, metadata: &ReportMetadata) -> ReportResult<()>;

    /// Executive summary and category overview.
    fn add_summary(&mut self, summary: &ReportSummary) -> ReportResult<()>;

    /// Opens a category. Categories that produced no section are never
    /// opened, so they get neither a heading nor a trailing page break.
    fn add_category_heading(&mut self, name: &str, question_count: usize) -> ReportResult<()>;

    fn add_question_section(
        &mut self,
        number: usize,
        heading: &str,
        table: &[FrequencyRow],
        chart: Option<&ChartRef>,
        insights: &[String],
    ) -> ReportResult<()>;

    fn add_page_break(&mut self) -> ReportResult<()>;

    /// Write the document; returns its location.
    fn finalize(&mut self) -> ReportResult<PathBuf>;
}

/// Feed a report through a sink.
///
/// `charts` holds one entry per section, in section order; `None` for
/// sections without a chart.
pub fn write_document(
    report: &Report,
    charts: &[Option<ChartRef>],
    sink: &mut dyn RenderSink,
) -> ReportResult<PathBuf> {
    sink.begin_document(&report.metadata)?;
    sink.add_summary(&report.summary)?;
    sink.add_page_break()?;

    let mut charts = charts.iter();
    for item in &report.items {
        match item {
            ReportItem::CategoryHeading {
                name,
                question_count,
            } => sink.add_category_heading(name, *question_count)?,
            ReportItem::Section(section) => {
                let chart = charts.next().ok_or_else(|| {
                    ReportError::render(&section.question.id, "no chart slot for section")
                })?;
                sink.add_question_section(
                    section.number,
                    &section.heading,
                    &section.table,
                    chart.as_ref(),
                    &section.insights,
                )?;
            }
            ReportItem::CategoryBoundary => sink.add_page_break()?,
        }
    }

    sink.finalize()
}

/// File stem for a question: every char outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn sanitize_file_stem(question: &str) -> ReportResult<String> {
    static NON_WORD: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = NON_WORD
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]"))
        .as_ref()
        .map_err(|e| ReportError::render(question, e))?;
    Ok(re.replace_all(question, "_").into_owned())
}

/// Chart file name for a question.
pub fn chart_file_name(question: &str) -> ReportResult<String> {
    Ok(format!("{}_chart.svg", sanitize_file_stem(question)?))
}

/// Cut a table cell to `max_chars` characters, marking the cut with "...".
pub fn truncate_cell(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let cut: String = value.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap_label(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("19. Reasons").unwrap(), "19._Reasons");
        assert_eq!(
            sanitize_file_stem("45. I identify as:").unwrap(),
            "45._I_identify_as_"
        );
        assert_eq!(sanitize_file_stem("a/b?c-d_e").unwrap(), "a_b_c-d_e");
        assert_eq!(
            chart_file_name("19. Reasons").unwrap(),
            "19._Reasons_chart.svg"
        );
    }

    #[test]
    fn test_truncate_cell() {
        let long = "x".repeat(60);
        let cut = truncate_cell(&long, 50);
        assert_eq!(cut.len(), 53);
        assert!(cut.ends_with("..."));

        assert_eq!(truncate_cell("short", 50), "short");
        assert_eq!(truncate_cell(&"y".repeat(50), 50), "y".repeat(50));
    }

    #[test]
    fn test_wrap_label() {
        assert_eq!(
            wrap_label("Strongly agree with the statement", 15),
            vec!["Strongly agree", "with the", "statement"]
        );
        assert_eq!(wrap_label("Yes", 15), vec!["Yes"]);
        assert_eq!(wrap_label("", 15), vec![""]);
        assert_eq!(wrap_label("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }
}
