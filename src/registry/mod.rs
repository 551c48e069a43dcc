//! Category registry.
//!
//! The registry is built once from `[registry]` and `[layout.overrides]`
//! and is read-only afterwards. It is passed explicitly to the assembler,
//! so tests can swap in small fixture registries.

use crate::config::{CanvasConfig, Config, LayoutOverride, RegistryConfig};
use crate::error::{ReportError, ReportResult};
use crate::models::{CategoryOverview, QuestionId};
use std::collections::{HashMap, HashSet};

/// A named group of questions in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub questions: Vec<QuestionId>,
}

/// Immutable category/question mapping plus per-question metadata.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    excluded: HashSet<String>,
    horizontal: HashSet<String>,
    overrides: HashMap<String, CanvasConfig>,
}

impl CategoryRegistry {
    /// Build and validate a registry.
    ///
    /// Fails when a question is listed in two categories, a category has no
    /// name, or a horizontal/override entry names an unregistered question.
    pub fn new(config: &RegistryConfig, overrides: &[LayoutOverride]) -> ReportResult<Self> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        let mut categories = Vec::with_capacity(config.categories.len());

        for cat in &config.categories {
            if cat.name.trim().is_empty() {
                return Err(ReportError::configuration("category with an empty name"));
            }
            for question in &cat.questions {
                if let Some(first) = seen.insert(question.as_str(), cat.name.as_str()) {
                    return Err(ReportError::configuration(format!(
                        "question '{}' is listed in both '{}' and '{}'",
                        question, first, cat.name
                    )));
                }
            }
            categories.push(Category {
                name: cat.name.clone(),
                questions: cat.questions.iter().map(QuestionId::new).collect(),
            });
        }

        let horizontal = config.forced_horizontal();
        for question in &horizontal {
            if !seen.contains_key(question.as_str()) {
                return Err(ReportError::configuration(format!(
                    "horizontal question '{}' is not in any category",
                    question
                )));
            }
        }

        let mut override_map = HashMap::new();
        for entry in overrides {
            if !seen.contains_key(entry.question.as_str()) {
                return Err(ReportError::configuration(format!(
                    "layout override '{}' is not in any category",
                    entry.question
                )));
            }
            override_map.insert(entry.question.clone(), entry.canvas());
        }

        Ok(Self {
            categories,
            excluded: config.excluded.iter().cloned().collect(),
            horizontal: horizontal.into_iter().collect(),
            overrides: override_map,
        })
    }

    pub fn from_config(config: &Config) -> ReportResult<Self> {
        Self::new(&config.registry, &config.layout_overrides())
    }

    pub fn categories_in_order(&self) -> &[Category] {
        &self.categories
    }

    /// Whether a column is metadata that is never reported on.
    pub fn is_excluded(&self, column: &str) -> bool {
        self.excluded.contains(column)
    }

    pub fn is_forced_horizontal(&self, question: &QuestionId) -> bool {
        self.horizontal.contains(&question.id) || self.overrides.contains_key(&question.id)
    }

    /// Larger canvas for questions with a layout override.
    pub fn layout_override(&self, question: &QuestionId) -> Option<&CanvasConfig> {
        self.overrides.get(&question.id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&QuestionId> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter())
            .find(|q| q.id == id)
    }

    /// Total number of registered questions.
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    pub fn overview(&self) -> Vec<CategoryOverview> {
        self.categories
            .iter()
            .map(|c| CategoryOverview {
                name: c.name.clone(),
                question_count: c.questions.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;

    fn fixture(categories: &[(&str, &[&str])], horizontal: &[&str]) -> RegistryConfig {
        RegistryConfig {
            excluded: vec!["1. Id".to_string(), "4. Email".to_string()],
            horizontal: Some(horizontal.iter().map(|s| s.to_string()).collect()),
            categories: categories
                .iter()
                .map(|(name, qs)| CategoryConfig {
                    name: name.to_string(),
                    questions: qs.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn wide(question: &str) -> LayoutOverride {
        LayoutOverride {
            question: question.to_string(),
            width: 14.0,
            min_height: 10.0,
            row_height: 0.8,
            label_wrap: 70,
        }
    }

    #[test]
    fn test_default_registry_is_valid() {
        let registry = CategoryRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.categories_in_order().len(), 9);
        assert_eq!(
            registry.categories_in_order()[0].name,
            "Course & Academic Background"
        );
        assert_eq!(registry.question_count(), 56);
        assert!(registry.is_excluded("5. Full name"));
        assert!(!registry.is_excluded("9. What course are you studying?"));
    }

    #[test]
    fn test_registry_preserves_order() {
        let config = fixture(&[("B", &["3. c", "2. b"]), ("A", &["1. a"])], &[]);
        let registry = CategoryRegistry::new(&config, &[]).unwrap();
        let names: Vec<_> = registry
            .categories_in_order()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(registry.categories_in_order()[0].questions[0].id, "3. c");
    }

    #[test]
    fn test_duplicate_question_is_configuration_error() {
        let config = fixture(&[("A", &["1. a"]), ("B", &["1. a"])], &[]);
        let err = CategoryRegistry::new(&config, &[]).unwrap_err();
        assert!(matches!(err, ReportError::Configuration { .. }));
        assert!(err.to_string().contains("1. a"));
    }

    #[test]
    fn test_unregistered_horizontal_is_configuration_error() {
        let config = fixture(&[("A", &["1. a"])], &["9. nowhere"]);
        assert!(CategoryRegistry::new(&config, &[]).is_err());
    }

    #[test]
    fn test_unregistered_override_is_configuration_error() {
        let config = fixture(&[("A", &["1. a"])], &[]);
        assert!(CategoryRegistry::new(&config, &[wide("2. b")]).is_err());
    }

    #[test]
    fn test_forced_horizontal_and_overrides() {
        let config = fixture(&[("A", &["1. a", "2. b", "3. c"])], &["1. a"]);
        let registry = CategoryRegistry::new(&config, &[wide("2. b")]).unwrap();

        assert!(registry.is_forced_horizontal(&QuestionId::new("1. a")));
        // An override implies horizontal bars.
        assert!(registry.is_forced_horizontal(&QuestionId::new("2. b")));
        assert!(!registry.is_forced_horizontal(&QuestionId::new("3. c")));

        assert!(registry.layout_override(&QuestionId::new("2. b")).is_some());
        assert!(registry.layout_override(&QuestionId::new("1. a")).is_none());
    }

    #[test]
    fn test_custom_categories_drop_stock_layout_lists() {
        let toml_content = r#"
[registry]
excluded = ["1. Id"]

[[registry.categories]]
name = "Only"
questions = ["2. Colour", "3. Size"]
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        let registry = CategoryRegistry::from_config(&config).unwrap();

        assert_eq!(registry.question_count(), 2);
        assert!(!registry.is_forced_horizontal(&QuestionId::new("2. Colour")));
        assert!(registry.layout_override(&QuestionId::new("3. Size")).is_none());
    }

    #[test]
    fn test_stock_categories_keep_stock_layout_lists() {
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert!(config.registry.horizontal.is_none());

        let registry = CategoryRegistry::from_config(&config).unwrap();
        let forced = registry
            .find("19. What are your reasons for choosing the course you have applied for?")
            .map(|q| registry.is_forced_horizontal(q));
        assert_eq!(forced, Some(true));
    }

    #[test]
    fn test_find_and_overview() {
        let config = fixture(&[("A", &["1. a", "2. b"]), ("B", &["3. c"])], &[]);
        let registry = CategoryRegistry::new(&config, &[]).unwrap();

        assert!(registry.contains("3. c"));
        assert!(!registry.contains("4. d"));
        assert_eq!(registry.find("2. b").map(|q| q.label.as_str()), Some("b"));

        let overview = registry.overview();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].question_count, 2);
        assert_eq!(overview[1].name, "B");
    }
}
