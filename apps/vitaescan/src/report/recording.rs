//! In-memory canvas that records draw calls instead of painting them.
//!
//! Uses the same wrapping and table layout as `PdfCanvas`, so the offsets it
//! records are the offsets a real document would get.

use crate::report::canvas::{ReportCanvas, Rgb, Table, TextStyle};
use crate::report::font_metrics::get_metrics;
use crate::report::table::{layout_table, PageGeometry, TableLayout};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        page: usize,
        x: f32,
        y: f32,
        lines: Vec<String>,
        style: TextStyle,
    },
    Rule {
        page: usize,
        x1: f32,
        x2: f32,
        y: f32,
        color: Rgb,
    },
    Table {
        start_page: usize,
        start_y: f32,
        table: Table,
        layout: TableLayout,
    },
    NewPage {
        page: usize,
    },
}

pub struct RecordingCanvas {
    geometry: PageGeometry,
    pages: usize,
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: 1,
            ops: Vec::new(),
        }
    }

    /// Every text op as `(page, y, joined lines)`.
    pub fn texts(&self) -> Vec<(usize, f32, String)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { page, y, lines, .. } => Some((*page, *y, lines.join("\n"))),
                _ => None,
            })
            .collect()
    }

    /// Every rule op as `(page, y)`.
    pub fn rules(&self) -> Vec<(usize, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rule { page, y, .. } => Some((*page, *y)),
                _ => None,
            })
            .collect()
    }

    /// Every table op as `(start_page, start_y, table, layout)`.
    pub fn tables(&self) -> Vec<(usize, f32, &Table, &TableLayout)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Table {
                    start_page,
                    start_y,
                    table,
                    layout,
                } => Some((*start_page, *start_y, table, layout)),
                _ => None,
            })
            .collect()
    }

    /// Textual content of the whole recording, in draw order.
    pub fn transcript(&self) -> Vec<String> {
        let mut out = Vec::new();
        for op in &self.ops {
            match op {
                DrawOp::Text { lines, .. } => out.extend(lines.iter().cloned()),
                DrawOp::Table { table, .. } => {
                    out.push(table.head.join(" | "));
                    out.extend(table.body.iter().map(|row| row.join(" | ")));
                }
                DrawOp::Rule { .. } => out.push("---".to_string()),
                DrawOp::NewPage { page } => out.push(format!("<page {page}>")),
            }
        }
        out
    }
}

impl ReportCanvas for RecordingCanvas {
    fn page_width(&self) -> f32 {
        self.geometry.width
    }

    fn page_height(&self) -> f32 {
        self.geometry.height
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn start_new_page(&mut self) {
        self.pages += 1;
        self.ops.push(DrawOp::NewPage { page: self.pages });
    }

    fn draw_wrapped_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: f32,
        style: &TextStyle,
    ) -> usize {
        let lines = get_metrics(style.weight).wrap_text(text, max_width, style.size_pt);
        let count = lines.len();
        self.ops.push(DrawOp::Text {
            page: self.pages,
            x,
            y,
            lines,
            style: *style,
        });
        count
    }

    fn draw_rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb) {
        self.ops.push(DrawOp::Rule {
            page: self.pages,
            x1,
            x2,
            y,
            color,
        });
    }

    fn draw_table(&mut self, table: &Table, start_y: f32) -> f32 {
        let layout = layout_table(table, start_y, &self.geometry);
        let start_page = self.pages;
        self.pages += layout.pages_added;
        let end_y = layout.end_y;
        self.ops.push(DrawOp::Table {
            start_page,
            start_y,
            table: table.clone(),
            layout,
        });
        end_y
    }
}
