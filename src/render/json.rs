//! JSON document sink.
//!
//! Mirrors the Markdown document as structured data: summary, then
//! categories with their question sections. Page breaks carry no meaning
//! here and are dropped.

use super::{ChartRef, RenderSink};
use crate::error::{ReportError, ReportResult};
use crate::models::{FrequencyRow, ReportMetadata, ReportSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize)]
struct JsonDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ReportMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ReportSummary>,
    categories: Vec<JsonCategory>,
}

#[derive(Debug, Serialize)]
struct JsonCategory {
    name: String,
    question_count: usize,
    sections: Vec<JsonSection>,
}

#[derive(Debug, Serialize)]
struct JsonSection {
    number: usize,
    heading: String,
    table: Vec<FrequencyRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<String>,
    insights: Vec<String>,
}

/// Collects the document and writes pretty-printed JSON on `finalize`.
pub struct JsonSink {
    path: PathBuf,
    document: JsonDocument,
}

impl JsonSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: JsonDocument::default(),
        }
    }

    /// Serialize the document built so far.
    pub fn to_json(&self) -> ReportResult<String> {
        serde_json::to_string_pretty(&self.document)
            .map_err(|e| ReportError::render(self.path.display().to_string(), e))
    }
}

impl RenderSink for JsonSink {
    fn begin_document(&mut self, metadata: &ReportMetadata) -> ReportResult<()> {
        self.document.metadata = Some(metadata.clone());
        Ok(())
    }

    fn add_summary(&mut self, summary: &ReportSummary) -> ReportResult<()> {
        self.document.summary = Some(summary.clone());
        Ok(())
    }

    fn add_category_heading(&mut self, name: &str, question_count: usize) -> ReportResult<()> {
        self.document.categories.push(JsonCategory {
            name: name.to_string(),
            question_count,
            sections: Vec::new(),
        });
        Ok(())
    }

    fn add_question_section(
        &mut self,
        number: usize,
        heading: &str,
        table: &[FrequencyRow],
        chart: Option<&ChartRef>,
        insights: &[String],
    ) -> ReportResult<()> {
        let category = self
            .document
            .categories
            .last_mut()
            .ok_or_else(|| ReportError::render(heading, "section outside of any category"))?;

        category.sections.push(JsonSection {
            number,
            heading: heading.to_string(),
            table: table.to_vec(),
            chart: chart.map(|c| c.link.clone()),
            insights: insights.to_vec(),
        });
        Ok(())
    }

    fn add_page_break(&mut self) -> ReportResult<()> {
        Ok(())
    }

    fn finalize(&mut self) -> ReportResult<PathBuf> {
        let json = self.to_json()?;
        std::fs::write(&self.path, json)
            .map_err(|e| ReportError::render(self.path.display().to_string(), e))?;
        info!("Wrote JSON report to {}", self.path.display());

        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sections_nest_under_categories() {
        let mut sink = JsonSink::new(PathBuf::from("unused.json"));
        sink.begin_document(&ReportMetadata {
            title: "Survey".to_string(),
            subtitle: "Analysis".to_string(),
            source: "transitions.csv".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 9, 1, 10, 30, 0).unwrap(),
            questions_processed: 1,
            categories_rendered: 1,
        })
        .unwrap();
        sink.add_category_heading("Demographics", 1).unwrap();
        sink.add_question_section(
            1,
            "Q1: I identify as:",
            &[FrequencyRow {
                value: "Female".to_string(),
                count: 3,
                percentage: 100.0,
            }],
            None,
            &["Total responses: 3".to_string()],
        )
        .unwrap();
        sink.add_page_break().unwrap();

        let value: serde_json::Value = serde_json::from_str(&sink.to_json().unwrap()).unwrap();
        assert_eq!(value["metadata"]["title"], "Survey");
        assert_eq!(value["metadata"]["source"], "transitions.csv");
        assert_eq!(value["metadata"]["generated_at"], "2024-09-01T10:30:00Z");
        assert_eq!(value["categories"][0]["name"], "Demographics");
        assert_eq!(value["categories"][0]["sections"][0]["number"], 1);
        assert_eq!(value["categories"][0]["sections"][0]["table"][0]["value"], "Female");
        assert!(value["categories"][0]["sections"][0].get("chart").is_none());
    }

    #[test]
    fn test_section_without_category_is_error() {
        let mut sink = JsonSink::new(PathBuf::from("unused.json"));
        let err = sink
            .add_question_section(1, "Q1: Orphan", &[], None, &[])
            .unwrap_err();
        assert!(matches!(err, ReportError::Render { .. }));
    }
}
