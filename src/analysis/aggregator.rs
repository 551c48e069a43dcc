//! Response aggregation and insight text.
//!
//! Turns the raw answers to one question into a frequency table and the
//! short "key insights" lines shown under each chart.

use crate::error::{ReportError, ReportResult};
use crate::models::{FrequencyRow, FrequencyTable};
use std::collections::HashMap;

/// Count distinct responses, most frequent first.
///
/// Values are grouped by exact string equality. Equal counts keep the order
/// in which the values first appeared. Percentages are rounded half-up to
/// one decimal, so their sum may drift from 100 by a few tenths.
pub fn aggregate(question: &str, responses: &[String]) -> ReportResult<FrequencyTable> {
    if responses.is_empty() {
        return Err(ReportError::EmptyInput {
            question: question.to_string(),
        });
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for response in responses {
        match index.get(response.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(response.as_str(), counts.len());
                counts.push((response.as_str(), 1));
            }
        }
    }

    // sort_by is stable, so ties stay in first-appearance order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = responses.len();
    let rows = counts
        .into_iter()
        .map(|(value, count)| FrequencyRow {
            value: value.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    Ok(FrequencyTable::from_rows(rows))
}

/// `count / total * 100`, rounded half-up to one decimal place.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Key insight lines for one question.
pub fn insights(table: &FrequencyTable) -> Vec<String> {
    let mut lines = vec![format!("Total responses: {}", table.total())];

    if let Some(top) = table.most_common() {
        lines.push(format!(
            "Most common response: '{}' ({:.1}%)",
            top.value, top.percentage
        ));
    }

    lines.push(format!(
        "Response diversity: {} different responses provided",
        table.len()
    ));

    if let Some(second) = table.second_most_common() {
        lines.push(format!(
            "Second most common: '{}' ({:.1}%)",
            second.value, second.percentage
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn as_tuples(table: &FrequencyTable) -> Vec<(&str, usize, f64)> {
        table
            .rows()
            .iter()
            .map(|r| (r.value.as_str(), r.count, r.percentage))
            .collect()
    }

    #[test]
    fn test_reasons_example() {
        let data = responses(&["Good reputation", "Location", "Good reputation", "Cost"]);
        let table = aggregate("19. Reasons", &data).unwrap();

        assert_eq!(
            as_tuples(&table),
            vec![
                ("Good reputation", 2, 50.0),
                ("Location", 1, 25.0),
                ("Cost", 1, 25.0),
            ]
        );
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = aggregate("9. Course", &[]).unwrap_err();
        assert!(matches!(err, ReportError::EmptyInput { ref question } if question == "9. Course"));
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let data = responses(&["c", "a", "b", "a", "b", "c", "d"]);
        let table = aggregate("q", &data).unwrap();
        let values: Vec<_> = table.rows().iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_no_normalization() {
        let data = responses(&["Yes", "yes", "Yes ", "Yes"]);
        let table = aggregate("q", &data).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].value, "Yes");
        assert_eq!(table.rows()[0].count, 2);
    }

    #[test]
    fn test_counts_sum_to_input_length() {
        let data = responses(&["a", "b", "a", "c", "c", "c", "d", "e", "a"]);
        let table = aggregate("q", &data).unwrap();
        let sum: usize = table.rows().iter().map(|r| r.count).sum();
        assert_eq!(sum, data.len());
        assert_eq!(table.total(), data.len());
    }

    #[test]
    fn test_percentages_sum_within_tolerance() {
        // Thirds and sevenths do not divide evenly.
        let data = responses(&["a", "b", "c", "d", "e", "f", "g", "a", "b", "c", "a"]);
        let table = aggregate("q", &data).unwrap();
        let sum: f64 = table.rows().iter().map(|r| r.percentage).sum();
        let tolerance = 0.1 * table.len() as f64;
        assert!((sum - 100.0).abs() <= tolerance, "sum was {}", sum);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 8), 12.5);
        // 6.25 rounds up, not to even
        assert_eq!(percentage(1, 16), 6.3);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_insights_with_two_values() {
        let data = responses(&["Good reputation", "Location", "Good reputation", "Cost"]);
        let table = aggregate("q", &data).unwrap();
        let lines = insights(&table);

        assert_eq!(
            lines,
            vec![
                "Total responses: 4".to_string(),
                "Most common response: 'Good reputation' (50.0%)".to_string(),
                "Response diversity: 3 different responses provided".to_string(),
                "Second most common: 'Location' (25.0%)".to_string(),
            ]
        );
    }

    #[test]
    fn test_insights_single_value_has_no_second() {
        let data = responses(&["Yes", "Yes"]);
        let table = aggregate("q", &data).unwrap();
        let lines = insights(&table);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("(100.0%)"));
        assert!(!lines.iter().any(|l| l.starts_with("Second")));
    }
}
