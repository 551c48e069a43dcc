//! SVG bar charts.
//!
//! One file per question, sized from the [`ChartSpec`] canvas (inches)
//! at a configurable pixel density.

use super::{chart_file_name, wrap_label, ChartRef, ChartRenderer};
use crate::error::{ReportError, ReportResult};
use crate::models::{ChartSpec, FrequencyTable, Orientation};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;

const TEXT_COLOR: &str = "#2F2F2F";
const TITLE_COLOR: &str = "#2C5F7A";
const FONT_SIZE: f64 = 13.0;
const LINE_HEIGHT: f64 = 16.0;
/// Rough glyph width used to reserve label space.
const CHAR_WIDTH: f64 = 7.0;
const TITLE_BAND: f64 = 60.0;
const PAD: f64 = 20.0;

/// Writes charts as standalone SVG files into one directory.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    out_dir: PathBuf,
    /// Prefix used when linking from the document.
    link_prefix: String,
    pixels_per_inch: f64,
}

impl SvgChartRenderer {
    pub fn new(out_dir: PathBuf, link_prefix: impl Into<String>, pixels_per_inch: f64) -> Self {
        Self {
            out_dir,
            link_prefix: link_prefix.into(),
            pixels_per_inch,
        }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(
        &self,
        question: &str,
        label: &str,
        table: &FrequencyTable,
        spec: &ChartSpec,
    ) -> ReportResult<ChartRef> {
        let file_name = chart_file_name(question)?;
        let path = self.out_dir.join(&file_name);
        let svg = render_svg(label, table, spec, self.pixels_per_inch);

        std::fs::write(&path, svg).map_err(|e| ReportError::render(question, e))?;
        debug!("Wrote chart {}", path.display());

        let link = if self.link_prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.link_prefix.trim_end_matches('/'), file_name)
        };

        Ok(ChartRef { path, link })
    }
}

/// Build the SVG document for one chart.
pub fn render_svg(
    label: &str,
    table: &FrequencyTable,
    spec: &ChartSpec,
    pixels_per_inch: f64,
) -> String {
    let width = spec.width * pixels_per_inch;
    let height = spec.height * pixels_per_inch;
    let max_count = table.rows().iter().map(|r| r.count).max().unwrap_or(1).max(1) as f64;

    let wrapped: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|r| wrap_label(&r.value, spec.label_wrap_width))
        .collect();

    let mut body = String::new();
    match spec.orientation {
        Orientation::Horizontal => {
            horizontal_bars(&mut body, table, &wrapped, spec, width, height, max_count)
        }
        Orientation::Vertical => {
            vertical_bars(&mut body, table, &wrapped, spec, width, height, max_count)
        }
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" style="background:white">
  <text x="{cx:.1}" y="35" text-anchor="middle" font-size="20" font-weight="bold" fill="{title_color}">{title}</text>
{body}</svg>
"##,
        w = width,
        h = height,
        cx = width / 2.0,
        title_color = TITLE_COLOR,
        title = escape_xml(label),
        body = body,
    )
}

fn horizontal_bars(
    out: &mut String,
    table: &FrequencyTable,
    wrapped: &[Vec<String>],
    spec: &ChartSpec,
    width: f64,
    height: f64,
    max_count: f64,
) {
    let longest = wrapped
        .iter()
        .flat_map(|lines| lines.iter().map(|l| l.chars().count()))
        .max()
        .unwrap_or(0) as f64;
    let left = (longest * CHAR_WIDTH + 2.0 * PAD).min(width * 0.5);
    let right = width - 3.0 * PAD;
    let top = TITLE_BAND;
    let bottom = height - 2.0 * PAD;

    let slot = (bottom - top) / table.len().max(1) as f64;
    let bar_height = slot * 0.7;
    let span = (right - left - 2.0 * PAD).max(1.0);

    axes(out, left, top, bottom, right, bottom);

    for (i, (row, lines)) in table.rows().iter().zip(wrapped).enumerate() {
        let y = top + i as f64 * slot + (slot - bar_height) / 2.0;
        let bar_width = row.count as f64 / max_count * span;
        let _ = writeln!(
            out,
            r##"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" opacity="0.8" stroke="white"/>"##,
            left, y, bar_width, bar_height, spec.color
        );
        let _ = writeln!(
            out,
            r##"  <text x="{:.1}" y="{:.1}" font-size="{}" font-weight="bold" fill="{}" dominant-baseline="middle">{}</text>"##,
            left + bar_width + 5.0,
            y + bar_height / 2.0,
            FONT_SIZE,
            TEXT_COLOR,
            row.count
        );

        let centre = y + bar_height / 2.0;
        let first = centre - (lines.len() as f64 - 1.0) * LINE_HEIGHT / 2.0;
        for (j, line) in lines.iter().enumerate() {
            let _ = writeln!(
                out,
                r##"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-size="{}" fill="{}" dominant-baseline="middle">{}</text>"##,
                left - 8.0,
                first + j as f64 * LINE_HEIGHT,
                FONT_SIZE,
                TEXT_COLOR,
                escape_xml(line)
            );
        }
    }

    axis_titles(out, "Count", "Response", width, height, left, top, bottom);
}

fn vertical_bars(
    out: &mut String,
    table: &FrequencyTable,
    wrapped: &[Vec<String>],
    spec: &ChartSpec,
    width: f64,
    height: f64,
    max_count: f64,
) {
    let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1) as f64;
    let left = 4.0 * PAD;
    let right = width - 2.0 * PAD;
    let top = TITLE_BAND;
    let bottom = (height - max_lines * LINE_HEIGHT - 3.0 * PAD).max(top + PAD);

    let slot = (right - left) / table.len().max(1) as f64;
    let bar_width = slot * 0.7;
    let span = (bottom - top - PAD).max(1.0);

    axes(out, left, top, bottom, right, bottom);

    for (i, (row, lines)) in table.rows().iter().zip(wrapped).enumerate() {
        let x = left + i as f64 * slot + (slot - bar_width) / 2.0;
        let bar_height = row.count as f64 / max_count * span;
        let y = bottom - bar_height;
        let _ = writeln!(
            out,
            r##"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" opacity="0.8" stroke="white"/>"##,
            x, y, bar_width, bar_height, spec.color
        );
        let _ = writeln!(
            out,
            r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="{}" font-weight="bold" fill="{}">{}</text>"##,
            x + bar_width / 2.0,
            y - 5.0,
            FONT_SIZE,
            TEXT_COLOR,
            row.count
        );
        for (j, line) in lines.iter().enumerate() {
            let _ = writeln!(
                out,
                r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="{}" fill="{}">{}</text>"##,
                x + bar_width / 2.0,
                bottom + LINE_HEIGHT * (j as f64 + 1.0),
                FONT_SIZE,
                TEXT_COLOR,
                escape_xml(line)
            );
        }
    }

    axis_titles(out, "Response", "Count", width, height, left, top, bottom);
}

fn axes(out: &mut String, x: f64, top: f64, bottom: f64, right: f64, y: f64) {
    let _ = writeln!(
        out,
        r##"  <line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="{c}" stroke-width="1"/>
  <line x1="{x:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="{c}" stroke-width="1"/>"##,
        c = TEXT_COLOR,
    );
}

#[allow(clippy::too_many_arguments)]
fn axis_titles(
    out: &mut String,
    x_title: &str,
    y_title: &str,
    width: f64,
    height: f64,
    left: f64,
    top: f64,
    bottom: f64,
) {
    let mid_y = (top + bottom) / 2.0;
    let _ = writeln!(
        out,
        r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14" font-weight="bold" fill="{}">{}</text>"##,
        (left + width) / 2.0,
        height - 8.0,
        TEXT_COLOR,
        x_title
    );
    let _ = writeln!(
        out,
        r##"  <text x="18" y="{:.1}" text-anchor="middle" font-size="14" font-weight="bold" fill="{}" transform="rotate(-90, 18, {:.1})">{}</text>"##,
        mid_y, TEXT_COLOR, mid_y, y_title
    );
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;

    fn spec(orientation: Orientation) -> ChartSpec {
        ChartSpec {
            orientation,
            width: 12.0,
            height: 8.0,
            label_wrap_width: 15,
            color: "#87CEEB".to_string(),
        }
    }

    fn table(values: &[&str]) -> FrequencyTable {
        let data: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        aggregate("q", &data).unwrap()
    }

    #[test]
    fn test_svg_has_one_bar_per_row() {
        let t = table(&["Yes", "No", "Yes", "Maybe"]);
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let svg = render_svg("Do you agree?", &t, &spec(orientation), 96.0);
            assert!(svg.starts_with("<svg"));
            assert_eq!(svg.matches("<rect").count(), 3);
            assert!(svg.contains(r#"width="1152""#));
            assert!(svg.contains("Do you agree?"));
        }
    }

    #[test]
    fn test_svg_escapes_labels() {
        let t = table(&["Tom & Jerry <3"]);
        let svg = render_svg("Q&A", &t, &spec(Orientation::Vertical), 96.0);
        assert!(svg.contains("Q&amp;A"));
        assert!(svg.contains("&lt;3"));
        assert!(!svg.contains("Tom & Jerry"));
    }

    #[test]
    fn test_renderer_writes_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgChartRenderer::new(dir.path().to_path_buf(), "charts", 96.0);
        let t = table(&["Good reputation", "Location", "Good reputation", "Cost"]);

        let chart = renderer
            .render("19. Reasons", "Reasons", &t, &spec(Orientation::Horizontal))
            .unwrap();

        assert_eq!(chart.path, dir.path().join("19._Reasons_chart.svg"));
        assert_eq!(chart.link, "charts/19._Reasons_chart.svg");
        let written = std::fs::read_to_string(&chart.path).unwrap();
        assert!(written.contains("Good reputation"));
    }

    #[test]
    fn test_renderer_reports_question_on_failure() {
        let renderer = SvgChartRenderer::new(PathBuf::from("/nonexistent/dir"), "", 96.0);
        let t = table(&["a"]);
        let err = renderer
            .render("9. Course", "Course", &t, &spec(Orientation::Vertical))
            .unwrap_err();
        assert!(matches!(err, ReportError::Render { ref question, .. } if question == "9. Course"));
    }
}
