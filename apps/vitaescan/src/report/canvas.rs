//! Drawing primitive consumed by the report generator.
//!
//! All coordinates are millimetres measured from the top-left corner of the
//! current page, y growing downwards. Text `y` is the first baseline.

use serde::{Deserialize, Serialize};

use crate::report::font_metrics::FontWeight;

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Grey level, same value on every channel.
    pub const fn grey(level: u8) -> Rgb {
        Rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size_pt: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColumnWidth {
    Fixed(f32),
    /// Shares the width left over by fixed columns equally with other `Auto` columns.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStyle {
    pub width: ColumnWidth,
    pub weight: FontWeight,
    pub align: Align,
    pub text_color: Rgb,
    /// Inner cell padding on every side, in millimetres.
    pub padding: f32,
}

impl Default for ColumnStyle {
    fn default() -> Self {
        Self {
            width: ColumnWidth::Auto,
            weight: FontWeight::Normal,
            align: Align::Left,
            text_color: Rgb::grey(20),
            padding: 1.76,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableTheme {
    /// Cell borders and a filled head row.
    Grid,
    /// No borders.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    pub theme: TableTheme,
    pub head_fill: Rgb,
    pub head_text: Rgb,
    pub head_font_size_pt: f32,
    pub body_font_size_pt: f32,
    /// One entry per column.
    pub columns: Vec<ColumnStyle>,
}

/// A table ready to draw: head row, body rows and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub style: TableStyle,
}

/// The drawing surface the generator paginates against.
///
/// `draw_table` owns its own pagination: when a row would cross the bottom
/// limit it starts a new page, continues at the top margin and reports the
/// end-of-table offset on the final page.
pub trait ReportCanvas {
    fn page_width(&self) -> f32;

    fn page_height(&self) -> f32;

    /// Number of pages started so far, including the first.
    fn page_count(&self) -> usize;

    fn start_new_page(&mut self);

    /// Draws `text` word-wrapped to `max_width` and returns the wrapped line count.
    fn draw_wrapped_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: f32,
        style: &TextStyle,
    ) -> usize;

    /// Thin horizontal rule from `x1` to `x2` at `y`.
    fn draw_rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb);

    /// Draws `table` from `start_y`; returns the end-of-table offset.
    fn draw_table(&mut self, table: &Table, start_y: f32) -> f32;
}
