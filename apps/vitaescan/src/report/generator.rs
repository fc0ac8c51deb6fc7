//! Report Generator — lays out the candidate comparison report.
//!
//! Flow: header → summary table → one detail block per candidate
//! (page-break check → separator → header line → quoted summary → pros/cons
//! table) → serialise → hand the bytes to the sink.
//!
//! The generator owns a single vertical cursor. It only paginates between
//! candidate blocks; pagination inside a table belongs to the canvas, and
//! the generator simply continues from the offset the canvas reports.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::models::candidate::{CandidateResult, ReportRequest};
use crate::report::canvas::{
    Align, ColumnStyle, ColumnWidth, ReportCanvas, Rgb, Table, TableStyle, TableTheme, TextStyle,
};
use crate::report::filename::report_filename;
use crate::report::font_metrics::FontWeight;
use crate::report::pdf::PdfCanvas;
use crate::report::sink::ReportSink;
use crate::report::table::PageGeometry;
use crate::report::ReportError;

// ────────────────────────────────────────────────────────────────────────────
// Layout constants (millimetres unless noted)
// ────────────────────────────────────────────────────────────────────────────

pub const MARGIN_X: f32 = 14.0;
pub const TOP_MARGIN: f32 = 20.0;

const TITLE_SIZE_PT: f32 = 18.0;
const TITLE_LINE_ADVANCE: f32 = 8.0;
const STAMP_SIZE_PT: f32 = 10.0;
const STAMP_ADVANCE: f32 = 10.0;
const SUMMARY_TABLE_GAP: f32 = 15.0;

/// Detail blocks starting below this fraction of the page height go to a new page.
pub const PAGE_BREAK_FRACTION: f32 = 0.775;
/// The first candidate skips its separator only while the cursor is at or above this offset.
pub const SEPARATOR_NEAR_TOP: f32 = 50.0;
const SEPARATOR_OFFSET: f32 = 5.0;

const CANDIDATE_HEADER_SIZE_PT: f32 = 14.0;
const CANDIDATE_HEADER_ADVANCE: f32 = 7.0;
const CANDIDATE_SUMMARY_SIZE_PT: f32 = 10.0;
const SUMMARY_LINE_ADVANCE: f32 = 5.0;
const SUMMARY_GAP: f32 = 5.0;
const COMPARISON_TABLE_GAP: f32 = 15.0;

const SUMMARY_HEAD: [&str; 3] = ["Candidato", "Match", "Resumen Ejecutivo"];
const COMPARISON_HEAD: [&str; 2] = ["Puntos Fuertes (Pros)", "Áreas de Mejora (Cons)"];
const BULLET: &str = "• ";

const PROS_COLOR: Rgb = Rgb(0, 120, 0);
const CONS_COLOR: Rgb = Rgb(180, 0, 0);

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Where the next element starts on the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub y: f32,
}

impl LayoutCursor {
    fn new() -> Self {
        Self { y: TOP_MARGIN }
    }

    fn advance(&mut self, by: f32) {
        self.y += by;
    }

    fn move_to(&mut self, y: f32) {
        self.y = y;
    }

    fn reset(&mut self) {
        self.y = TOP_MARGIN;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row builders
// ────────────────────────────────────────────────────────────────────────────

/// One `[filename, "<score>%", summary]` row per candidate, in input order.
pub fn summary_rows(results: &[CandidateResult]) -> Vec<Vec<String>> {
    results
        .iter()
        .map(|r| vec![r.filename.clone(), format!("{}%", r.score), r.summary.clone()])
        .collect()
}

/// Positional zip of pros and cons, padded with empty strings on the shorter side.
/// An empty item stays an empty cell, without a bullet.
pub fn comparison_rows(candidate: &CandidateResult) -> Vec<Vec<String>> {
    let bulleted = |items: &[String], i: usize| {
        items
            .get(i)
            .filter(|item| !item.is_empty())
            .map(|item| format!("{BULLET}{item}"))
            .unwrap_or_default()
    };
    let rows = candidate.pros.len().max(candidate.cons.len());
    (0..rows)
        .map(|i| vec![bulleted(&candidate.pros, i), bulleted(&candidate.cons, i)])
        .collect()
}

/// The separator is skipped only for the first candidate while nothing has
/// pushed the report past its first page and the cursor is still near the top.
pub fn needs_separator(index: usize, page_count: usize, cursor_y: f32) -> bool {
    !(index == 0 && page_count <= 1 && cursor_y <= SEPARATOR_NEAR_TOP)
}

fn summary_table(results: &[CandidateResult]) -> Table {
    Table {
        head: SUMMARY_HEAD.iter().map(|s| s.to_string()).collect(),
        body: summary_rows(results),
        style: TableStyle {
            theme: TableTheme::Grid,
            head_fill: Rgb::grey(50),
            head_text: Rgb::WHITE,
            head_font_size_pt: 10.0,
            body_font_size_pt: 10.0,
            columns: vec![
                ColumnStyle {
                    width: ColumnWidth::Fixed(50.0),
                    weight: FontWeight::Bold,
                    ..ColumnStyle::default()
                },
                ColumnStyle {
                    width: ColumnWidth::Fixed(20.0),
                    align: Align::Center,
                    ..ColumnStyle::default()
                },
                ColumnStyle::default(),
            ],
        },
    }
}

fn comparison_table(candidate: &CandidateResult) -> Table {
    let column = |color| ColumnStyle {
        text_color: color,
        padding: 2.0,
        ..ColumnStyle::default()
    };
    Table {
        head: COMPARISON_HEAD.iter().map(|s| s.to_string()).collect(),
        body: comparison_rows(candidate),
        style: TableStyle {
            theme: TableTheme::Plain,
            head_fill: Rgb::WHITE,
            head_text: Rgb::BLACK,
            head_font_size_pt: 10.0,
            body_font_size_pt: 9.0,
            columns: vec![column(PROS_COLOR), column(CONS_COLOR)],
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Draws the full report onto `canvas`. Deterministic for a given input,
/// date and page geometry.
pub fn render_report<C: ReportCanvas + ?Sized>(
    canvas: &mut C,
    job_title: &str,
    results: &[CandidateResult],
    generated_on: NaiveDate,
) {
    let page_width = canvas.page_width();
    let text_width = page_width - MARGIN_X * 2.0;
    let break_threshold = canvas.page_height() * PAGE_BREAK_FRACTION;
    let mut cursor = LayoutCursor::new();

    // 1. Header
    let title_lines = canvas.draw_wrapped_text(
        &format!("Reporte: {job_title}"),
        MARGIN_X,
        cursor.y,
        text_width,
        &TextStyle {
            size_pt: TITLE_SIZE_PT,
            weight: FontWeight::Normal,
            color: Rgb::BLACK,
        },
    );
    cursor.advance(title_lines as f32 * TITLE_LINE_ADVANCE);

    canvas.draw_wrapped_text(
        &format!(
            "Generado por VitaeScan AI - {}",
            generated_on.format("%d/%m/%Y")
        ),
        MARGIN_X,
        cursor.y,
        text_width,
        &TextStyle {
            size_pt: STAMP_SIZE_PT,
            weight: FontWeight::Normal,
            color: Rgb::grey(100),
        },
    );
    cursor.advance(STAMP_ADVANCE);

    // 2. Summary table
    let end_y = canvas.draw_table(&summary_table(results), cursor.y);
    cursor.move_to(end_y + SUMMARY_TABLE_GAP);

    // 3. Candidate detail blocks
    for (index, candidate) in results.iter().enumerate() {
        if cursor.y > break_threshold {
            canvas.start_new_page();
            cursor.reset();
        }

        if needs_separator(index, canvas.page_count(), cursor.y) {
            canvas.draw_rule(
                MARGIN_X,
                page_width - MARGIN_X,
                cursor.y - SEPARATOR_OFFSET,
                Rgb::grey(220),
            );
        }

        canvas.draw_wrapped_text(
            &format!("{} ({}%)", candidate.filename, candidate.score),
            MARGIN_X,
            cursor.y,
            text_width,
            &TextStyle {
                size_pt: CANDIDATE_HEADER_SIZE_PT,
                weight: FontWeight::Bold,
                color: Rgb::BLACK,
            },
        );
        cursor.advance(CANDIDATE_HEADER_ADVANCE);

        let summary_lines = canvas.draw_wrapped_text(
            &format!("\"{}\"", candidate.summary),
            MARGIN_X,
            cursor.y,
            text_width,
            &TextStyle {
                size_pt: CANDIDATE_SUMMARY_SIZE_PT,
                weight: FontWeight::Normal,
                color: Rgb::grey(80),
            },
        );
        cursor.advance(summary_lines as f32 * SUMMARY_LINE_ADVANCE + SUMMARY_GAP);

        let end_y = canvas.draw_table(&comparison_table(candidate), cursor.y);
        cursor.move_to(end_y + COMPARISON_TABLE_GAP);

        debug!(
            candidate = %candidate.filename,
            page = canvas.page_count(),
            cursor = cursor.y,
            "Candidate block laid out"
        );
    }
}

/// Builds the PDF for `request` and hands it to `sink` under the sanitized filename.
///
/// The sink is called exactly once on success and never on failure.
pub fn generate_report(
    request: &ReportRequest,
    generated_on: NaiveDate,
    sink: &mut dyn ReportSink,
) -> Result<(), ReportError> {
    let mut canvas = PdfCanvas::new(PageGeometry::A4);
    render_report(&mut canvas, &request.job_title, &request.results, generated_on);

    let pages = canvas.page_count();
    let bytes = canvas.finish()?;
    let filename = report_filename(&request.job_title);

    info!(
        candidates = request.results.len(),
        pages,
        bytes = bytes.len(),
        filename = %filename,
        "Report generated"
    );

    sink.save(bytes, filename);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::recording::RecordingCanvas;
    use crate::report::sink::DownloadSink;

    fn candidate(filename: &str, score: u8, summary: &str, pros: &[&str], cons: &[&str]) -> CandidateResult {
        CandidateResult {
            filename: filename.to_string(),
            score,
            summary: summary.to_string(),
            pros: pros.iter().map(|s| s.to_string()).collect(),
            cons: cons.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn scenario() -> Vec<CandidateResult> {
        vec![
            candidate("a.pdf", 85, "Strong fit", &["X", "Y"], &["Z"]),
            candidate("b.pdf", 40, "Weak fit", &[], &["A", "B"]),
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn render(title: &str, results: &[CandidateResult]) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new(PageGeometry::A4);
        render_report(&mut canvas, title, results, date());
        canvas
    }

    fn row(left: &str, right: &str) -> Vec<String> {
        vec![left.to_string(), right.to_string()]
    }

    // ── row builders ────────────────────────────────────────────────────────

    #[test]
    fn test_summary_rows_keep_input_order_not_score_order() {
        let results = vec![
            candidate("low.pdf", 10, "", &[], &[]),
            candidate("high.pdf", 99, "", &[], &[]),
            candidate("mid.pdf", 50, "", &[], &[]),
        ];
        let rows = summary_rows(&results);
        let names: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["low.pdf", "high.pdf", "mid.pdf"]);
        assert_eq!(rows[1][1], "99%");
    }

    #[test]
    fn test_comparison_rows_pad_shorter_side_with_empty_strings() {
        let results = scenario();
        assert_eq!(
            comparison_rows(&results[0]),
            vec![row("• X", "• Z"), row("• Y", "")]
        );
        assert_eq!(
            comparison_rows(&results[1]),
            vec![row("", "• A"), row("", "• B")]
        );
    }

    #[test]
    fn test_comparison_rows_empty_when_no_pros_or_cons() {
        let c = candidate("c.pdf", 0, "Error", &[], &[]);
        assert!(comparison_rows(&c).is_empty());
    }

    #[test]
    fn test_comparison_rows_count_is_max_of_lengths() {
        let c = candidate("c.pdf", 60, "", &["1", "2", "3", "4"], &["a"]);
        let rows = comparison_rows(&c);
        assert_eq!(rows.len(), 4);
        assert!(rows[1..].iter().all(|r| r[1].is_empty()));
    }

    #[test]
    fn test_comparison_rows_empty_item_has_no_bullet() {
        let c = candidate("c.pdf", 70, "", &["", "Rust"], &["Go", ""]);
        assert_eq!(
            comparison_rows(&c),
            vec![row("", "• Go"), row("• Rust", "")]
        );
    }

    // ── separator rule ──────────────────────────────────────────────────────

    #[test]
    fn test_needs_separator_boundary() {
        assert!(!needs_separator(0, 1, SEPARATOR_NEAR_TOP));
        assert!(!needs_separator(0, 1, TOP_MARGIN));
        assert!(needs_separator(0, 1, SEPARATOR_NEAR_TOP + 0.01));
        assert!(needs_separator(1, 1, TOP_MARGIN));
        // After any page break the separator is always drawn.
        assert!(needs_separator(0, 2, TOP_MARGIN));
    }

    // ── full layout ─────────────────────────────────────────────────────────

    #[test]
    fn test_end_to_end_scenario() {
        let canvas = render("Backend Engineer", &scenario());
        let tables = canvas.tables();
        assert_eq!(tables.len(), 3, "summary + one comparison table per candidate");

        let (_, _, summary, _) = tables[0];
        assert_eq!(summary.head, vec!["Candidato", "Match", "Resumen Ejecutivo"]);
        assert_eq!(
            summary.body,
            vec![
                vec!["a.pdf".to_string(), "85%".to_string(), "Strong fit".to_string()],
                vec!["b.pdf".to_string(), "40%".to_string(), "Weak fit".to_string()],
            ]
        );

        assert_eq!(tables[1].2.head, vec!["Puntos Fuertes (Pros)", "Áreas de Mejora (Cons)"]);
        assert_eq!(tables[1].2.body, vec![row("• X", "• Z"), row("• Y", "")]);
        assert_eq!(tables[2].2.body, vec![row("", "• A"), row("", "• B")]);

        let texts: Vec<String> = canvas.texts().into_iter().map(|(_, _, t)| t).collect();
        assert_eq!(texts[0], "Reporte: Backend Engineer");
        assert_eq!(texts[1], "Generado por VitaeScan AI - 17/10/2026");
        assert_eq!(texts[2], "a.pdf (85%)");
        assert_eq!(texts[3], "\"Strong fit\"");
        assert_eq!(texts[4], "b.pdf (40%)");
        assert_eq!(texts[5], "\"Weak fit\"");
    }

    #[test]
    fn test_header_cursor_arithmetic() {
        let canvas = render("Backend Engineer", &scenario());
        let texts = canvas.texts();
        assert_eq!(texts[0].1, TOP_MARGIN);
        assert_eq!(texts[1].1, TOP_MARGIN + TITLE_LINE_ADVANCE);

        let (_, start_y, _, _) = canvas.tables()[0];
        assert_eq!(start_y, TOP_MARGIN + TITLE_LINE_ADVANCE + STAMP_ADVANCE);
    }

    #[test]
    fn test_long_title_advances_per_wrapped_line() {
        let title = "Principal Distributed Systems Engineer for Realtime Payments Infrastructure and Ledgers";
        let canvas = render(title, &[]);
        let texts = canvas.texts();
        let title_lines = texts[0].2.lines().count();
        assert!(title_lines >= 2, "title should wrap at 18pt");
        assert_eq!(texts[1].1, TOP_MARGIN + title_lines as f32 * TITLE_LINE_ADVANCE);
    }

    #[test]
    fn test_detail_block_follows_table_end() {
        let canvas = render("Backend Engineer", &scenario());
        let tables = canvas.tables();
        let texts = canvas.texts();

        let summary_end = tables[0].3.end_y;
        assert_eq!(texts[2].1, summary_end + SUMMARY_TABLE_GAP);

        // Candidate summary sits one header advance below the header line.
        assert_eq!(texts[3].1, texts[2].1 + CANDIDATE_HEADER_ADVANCE);

        // Comparison table starts after the summary paragraph (1 line) plus gap.
        let expected_table_y = texts[3].1 + (SUMMARY_LINE_ADVANCE + SUMMARY_GAP);
        assert_eq!(tables[1].1, expected_table_y);

        // Next candidate continues from the comparison table end.
        assert_eq!(texts[4].1, tables[1].3.end_y + COMPARISON_TABLE_GAP);
    }

    #[test]
    fn test_first_candidate_after_summary_table_gets_separator() {
        // The summary table always pushes the cursor past the near-top boundary,
        // so every candidate, the first included, is preceded by a rule.
        let canvas = render("Backend Engineer", &scenario());
        let rules = canvas.rules();
        assert_eq!(rules.len(), 2);
        let texts = canvas.texts();
        assert_eq!(rules[0].1, texts[2].1 - SEPARATOR_OFFSET);
        assert_eq!(rules[1].1, texts[4].1 - SEPARATOR_OFFSET);
    }

    #[test]
    fn test_empty_results_still_render_header_and_summary_table() {
        let canvas = render("Backend Engineer", &[]);
        assert_eq!(canvas.texts().len(), 2);
        let tables = canvas.tables();
        assert_eq!(tables.len(), 1);
        assert!(tables[0].2.body.is_empty());
        assert!(canvas.rules().is_empty());
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_candidate_without_pros_or_cons_gets_zero_row_table() {
        let results = vec![candidate("c.pdf", 0, "Error al procesar", &[], &[])];
        let canvas = render("QA", &results);
        let tables = canvas.tables();
        assert_eq!(tables.len(), 2);
        assert!(tables[1].2.body.is_empty());
        assert_eq!(tables[1].3.rows.len(), 1, "head row only");
    }

    #[test]
    fn test_many_candidates_break_pages_below_top_margin() {
        let results: Vec<CandidateResult> = (0..12)
            .map(|i| {
                candidate(
                    &format!("cv_{i}.pdf"),
                    (i * 7 % 100) as u8,
                    "Solid experience with Rust services, observability and on-call ownership.",
                    &["Rust", "Kubernetes", "Postgres"],
                    &["Limited frontend exposure", "No management experience"],
                )
            })
            .collect();
        let canvas = render("Platform Engineer", &results);

        assert!(canvas.page_count() > 1, "12 detail blocks cannot fit on one page");

        let threshold = PageGeometry::A4.height * PAGE_BREAK_FRACTION;
        for (page, y, text) in canvas.texts() {
            if page > 1 {
                assert!(y >= TOP_MARGIN, "'{text}' drawn above top margin on page {page}");
            }
        }
        for (page, y) in canvas.rules() {
            if page > 1 {
                assert!(y >= TOP_MARGIN - SEPARATOR_OFFSET);
            }
        }
        // Every candidate header starts at or above the break threshold.
        for (_, y, text) in canvas.texts() {
            if text.starts_with("cv_") {
                assert!(y <= threshold, "header '{text}' starts below threshold at {y}");
            }
        }
        // Every candidate gets a separator.
        assert_eq!(canvas.rules().len(), results.len());
    }

    #[test]
    fn test_page_break_resets_cursor_to_top_margin() {
        let results: Vec<CandidateResult> = (0..8)
            .map(|i| candidate(&format!("cv_{i}.pdf"), 70, "Good", &["a", "b", "c"], &["d"]))
            .collect();
        let canvas = render("Role", &results);

        let broken_headers: Vec<_> = canvas
            .texts()
            .into_iter()
            .filter(|(page, y, text)| *page > 1 && text.starts_with("cv_") && *y == TOP_MARGIN)
            .collect();
        assert!(
            !broken_headers.is_empty(),
            "at least one candidate should start a fresh page at the top margin"
        );
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let first = render("Backend Engineer", &scenario());
        let second = render("Backend Engineer", &scenario());
        assert_eq!(first.transcript(), second.transcript());
        assert_eq!(first.ops, second.ops);
    }

    #[test]
    fn test_generate_report_saves_once_with_sanitized_name() {
        let request = ReportRequest {
            job_title: "Frontend Dev (Remote)!".to_string(),
            results: scenario(),
        };
        let mut sink = DownloadSink::new();
        generate_report(&request, date(), &mut sink).unwrap();

        assert_eq!(sink.save_count(), 1);
        let saved = sink.into_saved().unwrap();
        assert_eq!(saved.filename, "VitaeScan_FrontendDevRemote.pdf");
        assert!(saved.bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&saved.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_generate_report_empty_results_is_valid_document() {
        let request = ReportRequest {
            job_title: "Backend Engineer".to_string(),
            results: vec![],
        };
        let mut sink = DownloadSink::new();
        generate_report(&request, date(), &mut sink).unwrap();
        let saved = sink.into_saved().unwrap();
        assert!(lopdf::Document::load_mem(&saved.bytes).is_ok());
    }

    #[test]
    fn test_generate_report_page_count_matches_layout() {
        let results: Vec<CandidateResult> = (0..10)
            .map(|i| candidate(&format!("cv_{i}.pdf"), 55, "Average", &["a", "b"], &["c", "d", "e"]))
            .collect();
        let expected_pages = render("Role", &results).page_count();

        let request = ReportRequest {
            job_title: "Role".to_string(),
            results,
        };
        let mut sink = DownloadSink::new();
        generate_report(&request, date(), &mut sink).unwrap();
        let saved = sink.into_saved().unwrap();
        let doc = lopdf::Document::load_mem(&saved.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), expected_pages);
        assert!(expected_pages > 1);
    }
}
