//! Chart layout policy.
//!
//! Decides bar orientation and canvas size for one question. The decision
//! depends only on the question id, the frequency table and configuration.

use crate::config::LayoutConfig;
use crate::models::{ChartSpec, FrequencyTable, Orientation, QuestionId};
use crate::registry::CategoryRegistry;

/// Pure layout decision bound to a registry and layout settings.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPolicy<'a> {
    registry: &'a CategoryRegistry,
    config: &'a LayoutConfig,
}

impl<'a> LayoutPolicy<'a> {
    pub fn new(registry: &'a CategoryRegistry, config: &'a LayoutConfig) -> Self {
        Self { registry, config }
    }

    /// Whether the general rule alone asks for horizontal bars.
    pub fn use_horizontal(&self, question: &QuestionId, table: &FrequencyTable) -> bool {
        self.registry.is_forced_horizontal(question)
            || table.len() > self.config.horizontal_row_threshold
            || table.max_label_len() > self.config.label_length_threshold
    }

    pub fn decide(&self, question: &QuestionId, table: &FrequencyTable) -> ChartSpec {
        let rows = table.len();

        // Overrides win over the general rule and bring their own canvas.
        let (orientation, canvas) = match self.registry.layout_override(question) {
            Some(canvas) => (Orientation::Horizontal, canvas.clone()),
            None if self.use_horizontal(question, table) => {
                (Orientation::Horizontal, self.config.horizontal.clone())
            }
            None => (Orientation::Vertical, self.config.vertical.clone()),
        };

        ChartSpec {
            orientation,
            width: canvas.width,
            height: canvas.height_for(rows),
            label_wrap_width: canvas.label_wrap,
            color: self.config.color.clone(),
        }
    }
}
