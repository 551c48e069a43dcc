//! Data models for the survey report.
//!
//! This module contains the core data structures shared by the
//! aggregator, the layout policy, the assembler and the render sinks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identity and display text of one survey question.
///
/// `id` is the exact column name and is the only thing used for matching.
/// `label` is the column name with its ordinal prefix (`"19. "`) trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuestionId {
    pub id: String,
    pub label: String,
}

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let label = display_label(&id);
        Self { id, label }
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Strip a leading `"<digits>."` ordinal from a column name.
fn display_label(id: &str) -> String {
    let trimmed = id.trim();
    match trimmed.split_once('.') {
        Some((ordinal, rest))
            if !ordinal.is_empty() && ordinal.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// One distinct response value and its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

/// Distinct-value counts for one question, most frequent first.
///
/// Never empty: the aggregator refuses to build a table from no responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    rows: Vec<FrequencyRow>,
    total: usize,
}

impl FrequencyTable {
    pub(crate) fn from_rows(rows: Vec<FrequencyRow>) -> Self {
        let total = rows.iter().map(|r| r.count).sum();
        Self { rows, total }
    }

    pub fn rows(&self) -> &[FrequencyRow] {
        &self.rows
    }

    /// Sum of all counts, i.e. the number of responses aggregated.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn top(&self, n: usize) -> &[FrequencyRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn most_common(&self) -> Option<&FrequencyRow> {
        self.rows.first()
    }

    pub fn second_most_common(&self) -> Option<&FrequencyRow> {
        self.rows.get(1)
    }

    /// Longest value, measured in characters.
    pub fn max_label_len(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.value.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// Bar direction of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// How to draw one question's chart. Width and height are in inches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
    pub label_wrap_width: usize,
    pub color: String,
}

/// One question's complete report unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Display number, 1-based and global across categories.
    pub number: usize,
    pub question: QuestionId,
    pub heading: String,
    /// Rows shown in the document table.
    pub table: Vec<FrequencyRow>,
    /// `None` for a no-data placeholder.
    pub chart: Option<ChartSpec>,
    pub insights: Vec<String>,
    /// Full aggregate, used for charting.
    #[serde(skip)]
    pub frequencies: Option<FrequencyTable>,
}

impl Section {
    pub fn is_placeholder(&self) -> bool {
        self.frequencies.is_none()
    }
}

/// The ordered stream produced by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportItem {
    CategoryHeading { name: String, question_count: usize },
    Section(Section),
    /// Page break between two categories.
    CategoryBoundary,
}

impl ReportItem {
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            ReportItem::Section(section) => Some(section),
            _ => None,
        }
    }
}

/// One line of the category overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOverview {
    pub name: String,
    /// Number of questions registered in the category.
    pub question_count: usize,
}

/// Figures for the executive summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Non-excluded columns found in the input.
    pub questions_in_input: usize,
    /// Data rows in the input.
    pub respondents: usize,
    pub categories: Vec<CategoryOverview>,
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub subtitle: String,
    /// Name of the input file.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub questions_processed: usize,
    pub categories_rendered: usize,
}

/// The complete assembled report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.items.iter().filter_map(ReportItem::as_section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str, count: usize, percentage: f64) -> FrequencyRow {
        FrequencyRow {
            value: value.to_string(),
            count,
            percentage,
        }
    }

    #[test]
    fn test_question_label_trims_ordinal() {
        let q = QuestionId::new("19. What are your reasons for choosing the course?");
        assert_eq!(q.id, "19. What are your reasons for choosing the course?");
        assert_eq!(q.label, "What are your reasons for choosing the course?");
    }

    #[test]
    fn test_question_label_without_ordinal() {
        assert_eq!(QuestionId::new("Numeracy Skills").label, "Numeracy Skills");
        // A dot that is not an ordinal is part of the text.
        assert_eq!(QuestionId::new("e.g. anything").label, "e.g. anything");
    }

    #[test]
    fn test_table_accessors() {
        let table = FrequencyTable::from_rows(vec![
            row("Good reputation", 2, 50.0),
            row("Location", 1, 25.0),
            row("Cost", 1, 25.0),
        ]);

        assert_eq!(table.total(), 4);
        assert_eq!(table.len(), 3);
        assert_eq!(table.top(2).len(), 2);
        assert_eq!(table.top(10).len(), 3);
        assert_eq!(table.max_label_len(), "Good reputation".len());
        assert_eq!(table.most_common().map(|r| r.count), Some(2));
        assert_eq!(
            table.second_most_common().map(|r| r.value.as_str()),
            Some("Location")
        );
    }

    #[test]
    fn test_max_label_len_counts_chars() {
        let table = FrequencyTable::from_rows(vec![row("Très bien", 1, 100.0)]);
        assert_eq!(table.max_label_len(), 9);
    }

    #[test]
    fn test_orientation_display() {
        assert_eq!(Orientation::Horizontal.to_string(), "horizontal");
        assert_eq!(Orientation::Vertical.to_string(), "vertical");
    }
}
