//! Report assembly.
//!
//! Walks the registry in order, aggregates every question present in the
//! data, picks its chart layout and emits the ordered item stream consumed
//! by the render sinks.
//!
//! Question numbers are global across categories and are threaded through
//! the walk as a fold accumulator, so each number is handed out exactly
//! once and only to a question that produced a section.

use crate::analysis::{aggregate, insights};
use crate::error::{ReportError, ReportResult};
use crate::layout::LayoutPolicy;
use crate::models::{QuestionId, ReportItem, Section};
use crate::registry::{Category, CategoryRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Insight line used for questions without any usable response.
pub const NO_DATA_INSIGHT: &str = "No responses recorded";

/// What to do with a question that is in the data but has no responses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EmptyInputPolicy {
    /// Number the question and emit a "no data" section.
    #[default]
    Placeholder,
    /// Leave the question out; its number goes to the next question.
    Skip,
}

/// Drives one report run over a registry.
pub struct Assembler<'a> {
    registry: &'a CategoryRegistry,
    layout: LayoutPolicy<'a>,
    table_rows: usize,
    empty_policy: EmptyInputPolicy,
}

impl<'a> Assembler<'a> {
    pub fn new(
        registry: &'a CategoryRegistry,
        layout: LayoutPolicy<'a>,
        table_rows: usize,
        empty_policy: EmptyInputPolicy,
    ) -> Self {
        Self {
            registry,
            layout,
            table_rows,
            empty_policy,
        }
    }

    /// Assemble the item stream for `responses` (question id -> answers).
    ///
    /// Registered questions missing from `responses` are skipped silently.
    /// Categories with no emitted section are left out altogether, and a
    /// boundary separates consecutive categories but never ends the stream.
    pub fn assemble(
        &self,
        responses: &HashMap<String, Vec<String>>,
    ) -> ReportResult<Vec<ReportItem>> {
        let (_, blocks) = self.registry.categories_in_order().iter().try_fold(
            (1usize, Vec::new()),
            |(next, mut blocks), category| {
                let (next, sections) = self.assemble_category(category, responses, next)?;
                if !sections.is_empty() {
                    blocks.push((category.name.clone(), sections));
                }
                Ok::<_, ReportError>((next, blocks))
            },
        )?;

        let block_count = blocks.len();
        let mut items = Vec::new();
        for (i, (name, sections)) in blocks.into_iter().enumerate() {
            items.push(ReportItem::CategoryHeading {
                name,
                question_count: sections.len(),
            });
            items.extend(sections.into_iter().map(ReportItem::Section));
            if i + 1 < block_count {
                items.push(ReportItem::CategoryBoundary);
            }
        }

        Ok(items)
    }

    /// Sections for one category, and the next free question number.
    fn assemble_category(
        &self,
        category: &Category,
        responses: &HashMap<String, Vec<String>>,
        first_number: usize,
    ) -> ReportResult<(usize, Vec<Section>)> {
        category.questions.iter().try_fold(
            (first_number, Vec::new()),
            |(next, mut sections), question| {
                let Some(values) = responses.get(&question.id) else {
                    debug!("Question not in data, skipping: {}", question.id);
                    return Ok((next, sections));
                };

                match self.section(next, question, values) {
                    Ok(section) => {
                        sections.push(section);
                        Ok((next + 1, sections))
                    }
                    Err(e) if e.is_recoverable() => match self.empty_policy {
                        EmptyInputPolicy::Placeholder => {
                            warn!("{}, adding placeholder section", e);
                            sections.push(placeholder(next, question));
                            Ok((next + 1, sections))
                        }
                        EmptyInputPolicy::Skip => {
                            warn!("{}, skipping", e);
                            Ok((next, sections))
                        }
                    },
                    Err(e) => Err(e),
                }
            },
        )
    }

    fn section(
        &self,
        number: usize,
        question: &QuestionId,
        values: &[String],
    ) -> ReportResult<Section> {
        let table = aggregate(&question.id, values)?;
        let chart = self.layout.decide(question, &table);
        debug!(
            "Q{} '{}': {} responses, {} distinct, {} chart",
            number,
            question.id,
            table.total(),
            table.len(),
            chart.orientation
        );

        Ok(Section {
            number,
            question: question.clone(),
            heading: heading(number, question),
            table: table.top(self.table_rows).to_vec(),
            chart: Some(chart),
            insights: insights(&table),
            frequencies: Some(table),
        })
    }
}

fn heading(number: usize, question: &QuestionId) -> String {
    format!("Q{}: {}", number, question.label)
}

fn placeholder(number: usize, question: &QuestionId) -> Section {
    Section {
        number,
        question: question.clone(),
        heading: heading(number, question),
        table: Vec::new(),
        chart: None,
        insights: vec![NO_DATA_INSIGHT.to_string()],
        frequencies: None,
    }
}
