//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.survey-report.toml` files. The `[registry]` section carries the
//! category/question mapping; its default is the stock student
//! transition questionnaire.

use crate::assembler::EmptyInputPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".survey-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Document settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Chart layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Category registry.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output document path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Directory receiving one chart per question.
    #[serde(default = "default_charts_dir")]
    pub charts_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of charts rendered concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fail when a registered question is missing from the input header.
    #[serde(default)]
    pub strict_schema: bool,

    /// What to do with a question whose responses are all missing.
    #[serde(default)]
    pub empty_policy: EmptyInputPolicy,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            charts_dir: default_charts_dir(),
            verbose: false,
            concurrency: default_concurrency(),
            strict_schema: false,
            empty_policy: EmptyInputPolicy::default(),
        }
    }
}

fn default_output() -> String {
    "survey_report.md".to_string()
}

fn default_charts_dir() -> String {
    "charts".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Document text and table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    /// Rows shown in each question's table.
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,

    /// Table cells longer than this are cut and suffixed with "...".
    #[serde(default = "default_cell_max_chars")]
    pub cell_max_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            table_rows: default_table_rows(),
            cell_max_chars: default_cell_max_chars(),
        }
    }
}

fn default_title() -> String {
    "Student Transition Experience Survey".to_string()
}

fn default_subtitle() -> String {
    "Teesside University London - Comprehensive Analysis Report".to_string()
}

fn default_table_rows() -> usize {
    10
}

fn default_cell_max_chars() -> usize {
    50
}

/// Canvas size rule for one orientation class. Units are inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    /// Height floor.
    pub min_height: f64,
    /// Height per response row; zero for a fixed height.
    #[serde(default)]
    pub row_height: f64,
    /// Characters per line before a bar label wraps.
    pub label_wrap: usize,
}

impl CanvasConfig {
    pub fn height_for(&self, rows: usize) -> f64 {
        (rows as f64 * self.row_height).max(self.min_height)
    }
}

/// A question that always gets a horizontal chart on a larger canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverride {
    /// Exact question id (column name).
    pub question: String,
    pub width: f64,
    pub min_height: f64,
    #[serde(default)]
    pub row_height: f64,
    pub label_wrap: usize,
}

impl LayoutOverride {
    pub fn canvas(&self) -> CanvasConfig {
        CanvasConfig {
            width: self.width,
            min_height: self.min_height,
            row_height: self.row_height,
            label_wrap: self.label_wrap,
        }
    }
}

/// Chart layout thresholds and canvas sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// More rows than this switches to horizontal bars.
    #[serde(default = "default_row_threshold")]
    pub horizontal_row_threshold: usize,

    /// A label longer than this switches to horizontal bars.
    #[serde(default = "default_label_threshold")]
    pub label_length_threshold: usize,

    /// Bar fill color.
    #[serde(default = "default_color")]
    pub color: String,

    /// SVG pixels per inch of canvas.
    #[serde(default = "default_pixels_per_inch")]
    pub pixels_per_inch: f64,

    #[serde(default = "default_horizontal_canvas")]
    pub horizontal: CanvasConfig,

    #[serde(default = "default_vertical_canvas")]
    pub vertical: CanvasConfig,

    /// Larger canvases for single questions. When absent, the stock
    /// entries apply to the stock questionnaire only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<LayoutOverride>>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_row_threshold: default_row_threshold(),
            label_length_threshold: default_label_threshold(),
            color: default_color(),
            pixels_per_inch: default_pixels_per_inch(),
            horizontal: default_horizontal_canvas(),
            vertical: default_vertical_canvas(),
            overrides: Some(default_overrides()),
        }
    }
}

fn default_row_threshold() -> usize {
    6
}

fn default_label_threshold() -> usize {
    30
}

fn default_color() -> String {
    "#87CEEB".to_string()
}

fn default_pixels_per_inch() -> f64 {
    96.0
}

fn default_horizontal_canvas() -> CanvasConfig {
    CanvasConfig {
        width: 12.0,
        min_height: 8.0,
        row_height: 0.6,
        label_wrap: 50,
    }
}

fn default_vertical_canvas() -> CanvasConfig {
    CanvasConfig {
        width: 12.0,
        min_height: 8.0,
        row_height: 0.0,
        label_wrap: 15,
    }
}

fn default_overrides() -> Vec<LayoutOverride> {
    [
        "61. What are you hoping to achieve at Teesside University London?",
        "62. What are you most looking forward to about starting your course?",
    ]
    .into_iter()
    .map(|question| LayoutOverride {
        question: question.to_string(),
        width: 14.0,
        min_height: 10.0,
        row_height: 0.8,
        label_wrap: 70,
    })
    .collect()
}

/// One named group of questions, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub questions: Vec<String>,
}

/// Category/question mapping and per-column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Metadata columns never reported on.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,

    /// Questions that always use horizontal bars. When absent, the stock
    /// list applies to the stock questionnaire only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<Vec<String>>,

    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            excluded: default_excluded(),
            horizontal: Some(default_horizontal()),
            categories: default_categories(),
        }
    }
}

impl RegistryConfig {
    /// Whether the categories are the stock student transition questionnaire.
    pub fn is_stock(&self) -> bool {
        self.categories == default_categories()
    }

    /// Forced-horizontal questions, with the stock list filled in when unset.
    pub fn forced_horizontal(&self) -> Vec<String> {
        match self.horizontal {
            Some(ref questions) => questions.clone(),
            None if self.is_stock() => default_horizontal(),
            None => Vec::new(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_excluded() -> Vec<String> {
    strings(&[
        "1. Id",
        "2. Start time",
        "3. Completion time",
        "4. Email",
        "5. Full name",
        "6. Email",
        "7. ID",
    ])
}

fn default_horizontal() -> Vec<String> {
    strings(&[
        "19. What are your reasons for choosing the course you have applied for?",
        "20. What was it about the course you found most appealing?",
        "46. How would you describe your ethnicity?",
        "61. What are you hoping to achieve at Teesside University London?",
        "62. What are you most looking forward to about starting your course?",
        "63. Services you may access whilst studying on your course?",
    ])
}

fn category(name: &str, questions: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        questions: strings(questions),
    }
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        category(
            "Course & Academic Background",
            &[
                "8. Are you studying an undergraduate or postgraduate course?",
                "9. What course are you studying?",
                "10. What qualifications do you have? Please select all that apply",
                "11. What is your highest previous qualification?",
                "12. Did you study your highest previous qualification in the UK, or outside of the UK?",
                "13. Previous year situation",
            ],
        ),
        category(
            "Learning & Assessment Preferences",
            &[
                "14. Previously, how did you typically receive feedback on the work you submitted",
                "15. Preferred way of receiving feedback?",
                "16. Did you usually read your feedback? (Please select one option)",
                "17. Did you ever discuss the academic feedback?",
                "41. How many hours in total do you expect to study each week on top of your teaching hours?",
                "42. How do you prefer to study",
                "43. How you prefer to be assessed",
            ],
        ),
        category(
            "Course Motivation & Expectations",
            &[
                "18. Which of the following applies to you?",
                "19. What are your reasons for choosing the course you have applied for?",
                "20. What was it about the course you found most appealing?",
                "61. What are you hoping to achieve at Teesside University London?",
                "62. What are you most looking forward to about starting your course?",
            ],
        ),
        category(
            "Academic Skills Confidence",
            &[
                "21. Understanding reading material/applying this to assessments/technical tasks",
                "22. Please select one answer for each statement which best represents your feelings about your learning skills:",
                "23. Numeracy Skills",
                "24. Digital Skills -Using Teams to join virtual meetings/lectures/collaborating in gro",
                "25. Digital Skills - Using Teams to record a presentation",
                "26. Digital Skills - use of Microsoft Office such as Word and PowerP",
            ],
        ),
        category(
            "Transition Concerns",
            &[
                "27. How do you feel about: Getting used to living in a new country",
                "28. How do you feel about: Coping with the level of study at University",
                "29. How do you feel about: Getting used to moving away from home for the first time",
                "30. How do you feel about: Commuting to attend my studies",
                "31. How do you feel about: Adequate Information about how to study at University",
                "44. How do you feel about: Integrating into the local community",
                "40. How do you feel about: Your overall feeling about starting your course",
            ],
        ),
        category(
            "Practical Concerns",
            &[
                "32. How do you feel about: Managing Finances and /or debt",
                "33. How do you feel about: Finding Suitable Accommodation",
                "34. How do you feel about: Fitting my study around work commitments",
                "35. How do you feel about: Fitting my study around family commitments",
                "36. How do you feel about: Access to suitable Wi-Fi connection in my home",
                "37. How do you feel about: Access to suitable workspace in my home",
                "38. How do you feel about: Suitable / affordable childcare",
                "39. How do you feel about: Looking after my health and welfare",
            ],
        ),
        category(
            "Demographics",
            &[
                "45. I identify as:",
                "46. How would you describe your ethnicity?",
                "47. What is your identified religion?",
                "56. What is your age group?",
                "57. What is your marital Status?",
                "58. Do you consider English to be your first language?",
                "59. Rating your language skills, how do you consider your fluency in English?",
            ],
        ),
        category(
            "Background & Living Situation",
            &[
                "48. Are you a Care Leaver* with previous experience of being a child in care?",
                "49. Where is your permanent residency when you are NOT studying?",
                "50. Your place of accommodation while you study?",
                "51. Distance from where you are living when you start your studies?",
                "52. Will you be living:",
                "53. Do you plan to undertake paid work during your studies?",
                "54. Did your parents / guardians go to university?",
                "55. Brothers or sisters that are either studying at, or have been to, University?",
            ],
        ),
        category(
            "Support & Services",
            &[
                "60. Do you have a question about starting at Teesside University London?",
                "63. Services you may access whilst studying on your course?",
            ],
        ),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref charts_dir) = args.charts_dir {
            self.general.charts_dir = charts_dir.display().to_string();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(policy) = args.empty_policy {
            self.general.empty_policy = policy;
        }
        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }

        // Flags only ever switch things on
        if args.strict {
            self.general.strict_schema = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Layout overrides, with the stock entries filled in when unset and
    /// the registry is the stock questionnaire.
    pub fn layout_overrides(&self) -> Vec<LayoutOverride> {
        match self.layout.overrides {
            Some(ref overrides) => overrides.clone(),
            None if self.registry.is_stock() => default_overrides(),
            None => Vec::new(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
