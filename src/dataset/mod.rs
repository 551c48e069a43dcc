//! Survey CSV loading.
//!
//! Reads a survey export (header row plus one row per respondent) and
//! projects it onto the registry as `question id -> responses`.
//!
//! Missing answers: a cell that is exactly empty is dropped. Every other
//! value, whitespace included, is kept verbatim.

use crate::error::{ReportError, ReportResult};
use crate::registry::CategoryRegistry;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loaded survey table.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Read a CSV file with a header row.
    pub fn from_path(path: &Path) -> ReportResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| ReportError::Dataset {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_csv(path.to_path_buf(), reader)
    }

    /// Read CSV text from any reader; `source` is only used for naming.
    pub fn from_reader<R: Read>(source: impl Into<PathBuf>, reader: R) -> ReportResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self::from_csv(source.into(), reader)
    }

    fn from_csv<R: Read>(path: PathBuf, mut reader: csv::Reader<R>) -> ReportResult<Self> {
        let read_err = |source: csv::Error| ReportError::Dataset {
            path: path.clone(),
            source,
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(&read_err)?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(&read_err)?;
            rows.push(record.iter().map(String::from).collect());
        }

        info!(
            "Loaded {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            path.display()
        );

        Ok(Self {
            source: path,
            headers,
            rows,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source, for display.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of respondents (data rows).
    pub fn respondents(&self) -> usize {
        self.rows.len()
    }

    /// Columns that are not excluded metadata.
    pub fn question_columns<'a>(&'a self, registry: &'a CategoryRegistry) -> Vec<&'a str> {
        self.headers
            .iter()
            .map(String::as_str)
            .filter(|h| !registry.is_excluded(h))
            .collect()
    }

    /// Verify the input fits the registry.
    ///
    /// An input sharing no column with the registry is the wrong file. In
    /// strict mode every registered question must also have a column.
    pub fn check_schema(&self, registry: &CategoryRegistry, strict: bool) -> ReportResult<()> {
        let matched = self
            .headers
            .iter()
            .filter(|h| registry.contains(h))
            .count();

        if matched == 0 {
            return Err(ReportError::configuration(format!(
                "{} has no column matching a registered question",
                self.source_name()
            )));
        }

        for header in &self.headers {
            if !registry.contains(header) && !registry.is_excluded(header) {
                debug!("Ignoring unregistered column: {}", header);
            }
        }

        let missing: Vec<&str> = registry
            .categories_in_order()
            .iter()
            .flat_map(|c| c.questions.iter())
            .filter(|q| !self.headers.contains(&q.id))
            .map(|q| q.id.as_str())
            .collect();

        if !missing.is_empty() {
            if strict {
                return Err(ReportError::configuration(format!(
                    "{} registered question(s) missing from {}, first: '{}'",
                    missing.len(),
                    self.source_name(),
                    missing[0]
                )));
            }
            debug!("{} registered question(s) not in input", missing.len());
        }

        Ok(())
    }

    /// Responses per registered question, empty cells dropped.
    ///
    /// A registered question whose column exists but holds only empty cells
    /// maps to an empty list. Questions without a column are absent.
    pub fn responses(&self, registry: &CategoryRegistry) -> HashMap<String, Vec<String>> {
        let mut out: HashMap<String, Vec<String>> = HashMap::new();

        for (idx, header) in self.headers.iter().enumerate() {
            if registry.is_excluded(header) || !registry.contains(header) {
                continue;
            }
            if out.contains_key(header) {
                warn!("Duplicate column '{}', using the first one", header);
                continue;
            }

            let values = self
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .filter(|cell| !cell.is_empty())
                .cloned()
                .collect();
            out.insert(header.clone(), values);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, RegistryConfig};

    fn registry() -> CategoryRegistry {
        let config = RegistryConfig {
            excluded: vec!["1. Id".to_string(), "4. Email".to_string()],
            horizontal: None,
            categories: vec![CategoryConfig {
                name: "Course".to_string(),
                questions: vec![
                    "8. Level".to_string(),
                    "9. Course".to_string(),
                    "10. Qualifications".to_string(),
                ],
            }],
        };
        CategoryRegistry::new(&config, &[]).unwrap()
    }

    const CSV: &str = "\
1. Id,4. Email,8. Level,9. Course,Extra
1,a@x,Undergraduate,Computing,foo
2,b@x,Postgraduate,,bar
3,c@x,Undergraduate, ,baz
";

    fn load(text: &str) -> Dataset {
        Dataset::from_reader("transitions.csv", text.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_counts() {
        let ds = load(CSV);
        assert_eq!(ds.respondents(), 3);
        assert_eq!(ds.headers().len(), 5);
        assert_eq!(ds.source_name(), "transitions.csv");
    }

    #[test]
    fn test_question_columns_skip_excluded() {
        let ds = load(CSV);
        let reg = registry();
        assert_eq!(
            ds.question_columns(&reg),
            vec!["8. Level", "9. Course", "Extra"]
        );
    }

    #[test]
    fn test_responses_drop_empty_cells_only() {
        let ds = load(CSV);
        let responses = ds.responses(&registry());

        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses["8. Level"],
            vec!["Undergraduate", "Postgraduate", "Undergraduate"]
        );
        // The empty cell is gone, the single space is kept
        assert_eq!(responses["9. Course"], vec!["Computing", " "]);
        assert!(!responses.contains_key("10. Qualifications"));
        assert!(!responses.contains_key("1. Id"));
        assert!(!responses.contains_key("Extra"));
    }

    #[test]
    fn test_all_empty_column_maps_to_empty_list() {
        let ds = load("8. Level,9. Course\nA,\nB,\n");
        let responses = ds.responses(&registry());
        assert!(responses["9. Course"].is_empty());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let ds = load("8. Level,9. Course\nA\nB,Art\n");
        let responses = ds.responses(&registry());
        assert_eq!(responses["8. Level"], vec!["A", "B"]);
        assert_eq!(responses["9. Course"], vec!["Art"]);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let ds = load("\u{feff}8. Level,9. Course\nA,B\n");
        assert_eq!(ds.headers()[0], "8. Level");
    }

    #[test]
    fn test_schema_without_any_registered_column_fails() {
        let ds = load("a,b\n1,2\n");
        let err = ds.check_schema(&registry(), false).unwrap_err();
        assert!(matches!(err, ReportError::Configuration { .. }));
    }

    #[test]
    fn test_schema_strict_mode_requires_every_question() {
        let ds = load(CSV);
        let reg = registry();
        assert!(ds.check_schema(&reg, false).is_ok());

        let err = ds.check_schema(&reg, true).unwrap_err();
        assert!(err.to_string().contains("10. Qualifications"));
    }

    #[test]
    fn test_missing_file_is_dataset_error() {
        let err = Dataset::from_path(Path::new("/nonexistent/survey.csv")).unwrap_err();
        assert!(matches!(err, ReportError::Dataset { .. }));
    }
}
