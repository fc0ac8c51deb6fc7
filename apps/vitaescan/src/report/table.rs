//! Table layout: column widths, cell wrapping, row heights and page breaks.
//!
//! Pure geometry, no drawing. Every `ReportCanvas` backend runs the same
//! layout and then paints the placed rows, so pagination is identical across
//! backends.

use serde::{Deserialize, Serialize};

use crate::report::canvas::{ColumnStyle, ColumnWidth, Table};
use crate::report::font_metrics::{get_metrics, FontWeight, LINE_HEIGHT_FACTOR, PT_TO_MM};

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

/// Page size and margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Left and right margin.
    pub margin_x: f32,
    /// Where content resumes on a fresh page.
    pub top_margin: f32,
    /// Tables never place a row whose bottom crosses `height - bottom_margin`;
    /// rows taller than a page are split instead.
    pub bottom_margin: f32,
}

impl PageGeometry {
    /// A4 portrait, 14 mm side margins, 20 mm top margin.
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin_x: 14.0,
        top_margin: 20.0,
        bottom_margin: 14.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_x * 2.0
    }

    pub fn bottom_limit(&self) -> f32 {
        self.height - self.bottom_margin
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedCell {
    pub x: f32,
    pub width: f32,
    /// Wrapped text, at least one (possibly empty) line.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRow {
    /// Pages after the one the table started on (0 = starting page).
    pub page_offset: usize,
    /// Top edge of the row.
    pub y: f32,
    pub height: f32,
    pub is_head: bool,
    /// Index into `Table::body`; `None` for head rows.
    pub body_index: Option<usize>,
    pub cells: Vec<PlacedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub column_widths: Vec<f32>,
    pub rows: Vec<PlacedRow>,
    /// Bottom edge of the last row, on the final page.
    pub end_y: f32,
    /// How many new pages the table started.
    pub pages_added: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Resolves column widths. Fixed columns keep their width; `Auto` columns
/// split whatever is left equally (never below zero).
pub fn column_widths(columns: &[ColumnStyle], content_width: f32) -> Vec<f32> {
    let fixed: f32 = columns
        .iter()
        .filter_map(|c| match c.width {
            ColumnWidth::Fixed(w) => Some(w),
            ColumnWidth::Auto => None,
        })
        .sum();
    let auto_count = columns
        .iter()
        .filter(|c| c.width == ColumnWidth::Auto)
        .count();
    let auto_width = if auto_count == 0 {
        0.0
    } else {
        ((content_width - fixed) / auto_count as f32).max(0.0)
    };

    columns
        .iter()
        .map(|c| match c.width {
            ColumnWidth::Fixed(w) => w,
            ColumnWidth::Auto => auto_width,
        })
        .collect()
}

/// Line height in millimetres for a font size in points.
pub fn line_height(size_pt: f32) -> f32 {
    size_pt * LINE_HEIGHT_FACTOR * PT_TO_MM
}

#[derive(Clone)]
struct MeasuredRow {
    cells: Vec<Vec<String>>,
    paddings: Vec<f32>,
    line_height: f32,
    height: f32,
}

impl MeasuredRow {
    fn new(cells: Vec<Vec<String>>, paddings: Vec<f32>, line_height: f32) -> Self {
        let height = cells
            .iter()
            .zip(&paddings)
            .map(|(lines, padding)| lines.len() as f32 * line_height + padding * 2.0)
            .fold(0.0_f32, f32::max);
        Self {
            cells,
            paddings,
            line_height,
            height,
        }
    }

    fn max_padding(&self) -> f32 {
        self.paddings.iter().copied().fold(0.0_f32, f32::max)
    }

    /// Shortest piece the row can be cut into: one line plus padding.
    fn min_fragment_height(&self) -> f32 {
        self.line_height + self.max_padding() * 2.0
    }

    /// How many lines of every cell fit into `available` millimetres.
    fn lines_fitting(&self, available: f32) -> usize {
        ((available - self.max_padding() * 2.0) / self.line_height)
            .floor()
            .max(0.0) as usize
    }

    /// Cuts the first `count` lines off every cell. Returns `(head, rest)`.
    fn split_at(&self, count: usize) -> (MeasuredRow, MeasuredRow) {
        let (head, rest): (Vec<_>, Vec<_>) = self
            .cells
            .iter()
            .map(|lines| {
                let cut = count.min(lines.len());
                (lines[..cut].to_vec(), lines[cut..].to_vec())
            })
            .unzip();
        (
            MeasuredRow::new(head, self.paddings.clone(), self.line_height),
            MeasuredRow::new(rest, self.paddings.clone(), self.line_height),
        )
    }

    fn has_lines(&self) -> bool {
        self.cells.iter().any(|lines| !lines.is_empty())
    }
}

fn measure_row(
    cells: &[String],
    columns: &[ColumnStyle],
    widths: &[f32],
    size_pt: f32,
    weight_override: Option<FontWeight>,
) -> MeasuredRow {
    let wrapped: Vec<Vec<String>> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let column = &columns[i];
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            let metrics = get_metrics(weight_override.unwrap_or(column.weight));
            let inner = (width - column.padding * 2.0).max(1.0);
            metrics.wrap_text(text, inner, size_pt)
        })
        .collect();
    let paddings = columns.iter().map(|c| c.padding).collect();

    MeasuredRow::new(wrapped, paddings, line_height(size_pt))
}

/// Lays out `table` starting at `start_y` on the current page.
///
/// The head row is repeated at the top of every continuation page. If the
/// head plus the first body row do not fit below `start_y`, the whole table
/// moves to the next page. A row that fits on a fresh page is moved there
/// whole; a row taller than that is split line by line across pages, so
/// nothing is placed below `bottom_limit`.
pub fn layout_table(table: &Table, start_y: f32, geometry: &PageGeometry) -> TableLayout {
    let column_count = table.head.len();
    let columns: Vec<ColumnStyle> = (0..column_count)
        .map(|i| table.style.columns.get(i).cloned().unwrap_or_default())
        .collect();
    let widths = column_widths(&columns, geometry.content_width());

    let head = measure_row(
        &table.head,
        &columns,
        &widths,
        table.style.head_font_size_pt,
        Some(FontWeight::Bold),
    );
    let body: Vec<MeasuredRow> = table
        .body
        .iter()
        .map(|row| measure_row(row, &columns, &widths, table.style.body_font_size_pt, None))
        .collect();

    let place = |measured: &MeasuredRow, page_offset: usize, y: f32, body_index: Option<usize>| {
        let mut x = geometry.margin_x;
        let cells = measured
            .cells
            .iter()
            .zip(&widths)
            .map(|(lines, width)| {
                let lines = if lines.is_empty() {
                    vec![String::new()]
                } else {
                    lines.clone()
                };
                let cell = PlacedCell {
                    x,
                    width: *width,
                    lines,
                };
                x += width;
                cell
            })
            .collect();
        PlacedRow {
            page_offset,
            y,
            height: measured.height,
            is_head: body_index.is_none(),
            body_index,
            cells,
        }
    };

    let bottom = geometry.bottom_limit();
    let top = geometry.top_margin;
    // Room for body rows on a page that starts with the head.
    let page_capacity = bottom - top - head.height;
    let mut page_offset = 0usize;
    let mut y = start_y;
    let mut rows = Vec::with_capacity(body.len() + 1);

    let first_needed = match body.first() {
        Some(first) if first.height <= page_capacity => first.height,
        Some(first) => first.min_fragment_height(),
        None => 0.0,
    };
    if y + head.height + first_needed > bottom && y > top {
        page_offset += 1;
        y = top;
    }

    rows.push(place(&head, page_offset, y, None));
    y += head.height;
    let mut rows_on_page = 0usize;

    for (index, measured) in body.iter().enumerate() {
        let mut remaining = measured.clone();
        loop {
            let available = bottom - y;
            if remaining.height <= available {
                rows.push(place(&remaining, page_offset, y, Some(index)));
                y += remaining.height;
                rows_on_page += 1;
                break;
            }

            let fits_fresh_page = remaining.height <= page_capacity;
            let mut count = remaining.lines_fitting(available);
            if rows_on_page == 0 {
                // Fresh page: always make progress.
                count = count.max(1);
            }
            if !(fits_fresh_page && rows_on_page > 0) && count > 0 {
                let (piece, rest) = remaining.split_at(count);
                rows.push(place(&piece, page_offset, y, Some(index)));
                remaining = rest;
                if !remaining.has_lines() {
                    y += piece.height;
                    rows_on_page += 1;
                    break;
                }
            }

            page_offset += 1;
            y = top;
            rows.push(place(&head, page_offset, y, None));
            y += head.height;
            rows_on_page = 0;
        }
    }

    TableLayout {
        column_widths: widths,
        rows,
        end_y: y,
        pages_added: page_offset,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
