//! `ReportCanvas` backed by `lopdf`.
//!
//! Pages are accumulated as content-stream operations and only assembled
//! into a `lopdf::Document` in `finish`. Text uses the standard Type1 fonts
//! Helvetica (F1) and Helvetica-Bold (F2) with WinAnsi encoding, so no font
//! files are embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::report::canvas::{Align, ReportCanvas, Rgb, Table, TableTheme, TextStyle};
use crate::report::font_metrics::{get_metrics, FontWeight, PT_TO_MM};
use crate::report::table::{layout_table, line_height, PageGeometry, PlacedRow};
use crate::report::ReportError;

const MM_TO_PT: f32 = 1.0 / PT_TO_MM;
/// Stroke width for rules and grid lines, in millimetres.
const LINE_WIDTH_MM: f32 = 0.2;
/// Baseline distance below the top of a text line, as a fraction of the font size.
const ASCENT: f32 = 0.8;

pub struct PdfCanvas {
    geometry: PageGeometry,
    pages: Vec<Vec<Operation>>,
}

impl PdfCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Vec::new()],
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn to_pt_x(&self, x_mm: f32) -> f32 {
        x_mm * MM_TO_PT
    }

    /// Flips a top-down millimetre offset into PDF user space.
    fn to_pt_y(&self, y_mm: f32) -> f32 {
        (self.geometry.height - y_mm) * MM_TO_PT
    }

    fn show_text(&mut self, text: &str, x_mm: f32, baseline_mm: f32, style: &TextStyle) {
        let x = self.to_pt_x(x_mm);
        let y = self.to_pt_y(baseline_mm);
        let font = font_resource(style.weight);
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.to_vec()), Object::Real(style.size_pt)],
        ));
        ops.push(Operation::new("rg", color_operands(style.color)));
        ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn rect(&mut self, x_mm: f32, y_mm: f32, w_mm: f32, h_mm: f32, fill: Option<Rgb>, stroke: bool) {
        let operands = vec![
            Object::Real(self.to_pt_x(x_mm)),
            Object::Real(self.to_pt_y(y_mm + h_mm)),
            Object::Real(w_mm * MM_TO_PT),
            Object::Real(h_mm * MM_TO_PT),
        ];
        let ops = self.ops();
        if let Some(color) = fill {
            ops.push(Operation::new("rg", color_operands(color)));
            ops.push(Operation::new("re", operands.clone()));
            ops.push(Operation::new("f", vec![]));
        }
        if stroke {
            ops.push(Operation::new("w", vec![Object::Real(LINE_WIDTH_MM * MM_TO_PT)]));
            ops.push(Operation::new("RG", color_operands(Rgb::grey(200))));
            ops.push(Operation::new("re", operands));
            ops.push(Operation::new("S", vec![]));
        }
    }

    fn paint_row(&mut self, table: &Table, row: &PlacedRow) {
        let style = &table.style;
        let grid = style.theme == TableTheme::Grid;
        let size_pt = if row.is_head {
            style.head_font_size_pt
        } else {
            style.body_font_size_pt
        };

        for (i, cell) in row.cells.iter().enumerate() {
            let column = style.columns.get(i).cloned().unwrap_or_default();
            let fill = (row.is_head && style.head_fill != Rgb::WHITE).then_some(style.head_fill);
            self.rect(cell.x, row.y, cell.width, row.height, fill, grid);

            let text_style = if row.is_head {
                TextStyle {
                    size_pt,
                    weight: FontWeight::Bold,
                    color: style.head_text,
                }
            } else {
                TextStyle {
                    size_pt,
                    weight: column.weight,
                    color: column.text_color,
                }
            };
            let metrics = get_metrics(text_style.weight);
            let step = line_height(size_pt);
            let first_baseline = row.y + column.padding + size_pt * PT_TO_MM * ASCENT;

            for (n, line) in cell.lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let x = match column.align {
                    Align::Left => cell.x + column.padding,
                    Align::Center => {
                        cell.x + (cell.width - metrics.measure_str(line, size_pt)) / 2.0
                    }
                };
                self.show_text(line, x, first_baseline + n as f32 * step, &text_style);
            }
        }
    }

    /// Assembles the pages into a PDF document and serialises it.
    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => FontWeight::Normal.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => FontWeight::Bold.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| ReportError::Serialize(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(self.geometry.width * MM_TO_PT),
                    Object::Real(self.geometry.height * MM_TO_PT),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ReportError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

impl ReportCanvas for PdfCanvas {
    fn page_width(&self) -> f32 {
        self.geometry.width
    }

    fn page_height(&self) -> f32 {
        self.geometry.height
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn start_new_page(&mut self) {
        self.pages.push(Vec::new());
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
        let step = line_height(style.size_pt);
        for (n, line) in lines.iter().enumerate() {
            if !line.is_empty() {
                self.show_text(line, x, y + n as f32 * step, style);
            }
        }
        lines.len()
    }

    fn draw_rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb) {
        let (px1, px2, py) = (self.to_pt_x(x1), self.to_pt_x(x2), self.to_pt_y(y));
        let ops = self.ops();
        ops.push(Operation::new("w", vec![Object::Real(LINE_WIDTH_MM * MM_TO_PT)]));
        ops.push(Operation::new("RG", color_operands(color)));
        ops.push(Operation::new("m", vec![Object::Real(px1), Object::Real(py)]));
        ops.push(Operation::new("l", vec![Object::Real(px2), Object::Real(py)]));
        ops.push(Operation::new("S", vec![]));
    }

    fn draw_table(&mut self, table: &Table, start_y: f32) -> f32 {
        let layout = layout_table(table, start_y, &self.geometry);
        let mut current_offset = 0usize;
        for row in &layout.rows {
            while current_offset < row.page_offset {
                self.start_new_page();
                current_offset += 1;
            }
            self.paint_row(table, row);
        }
        layout.end_y
    }
}

fn font_resource(weight: FontWeight) -> &'static [u8] {
    match weight {
        FontWeight::Normal => b"F1",
        FontWeight::Bold => b"F2",
    }
}

fn color_operands(color: Rgb) -> Vec<Object> {
    let Rgb(r, g, b) = color;
    vec![
        Object::Real(r as f32 / 255.0),
        Object::Real(g as f32 / 255.0),
        Object::Real(b as f32 / 255.0),
    ]
}

/// Encodes text for a WinAnsiEncoding font. Latin-1 maps one to one; the
/// typographic characters WinAnsi places in 0x80..=0x9F are mapped
/// explicitly; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::canvas::{ColumnStyle, TableStyle};

    fn sample_table(rows: usize) -> Table {
        Table {
            head: vec!["Puntos Fuertes (Pros)".to_string(), "Áreas de Mejora (Cons)".to_string()],
            body: (0..rows)
                .map(|i| vec![format!("• pro {i}"), String::new()])
                .collect(),
            style: TableStyle {
                theme: TableTheme::Grid,
                head_fill: Rgb::grey(50),
                head_text: Rgb::WHITE,
                head_font_size_pt: 10.0,
                body_font_size_pt: 9.0,
                columns: vec![ColumnStyle::default(), ColumnStyle::default()],
            },
        }
    }

    #[test]
    fn test_encode_win_ansi_maps_spanish_and_bullets() {
        assert_eq!(encode_win_ansi("Á"), vec![0xC1]);
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("• X"), vec![0x95, b' ', b'X']);
        assert_eq!(encode_win_ansi("漢"), vec![b'?']);
    }

    #[test]
    fn test_finish_single_page_document_loads() {
        let mut canvas = PdfCanvas::new(PageGeometry::A4);
        let style = TextStyle {
            size_pt: 12.0,
            weight: FontWeight::Normal,
            color: Rgb::BLACK,
        };
        canvas.draw_wrapped_text("Reporte: Backend Engineer", 14.0, 20.0, 182.0, &style);
        let bytes = canvas.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_start_new_page_adds_page() {
        let mut canvas = PdfCanvas::new(PageGeometry::A4);
        canvas.start_new_page();
        canvas.start_new_page();
        assert_eq!(canvas.page_count(), 3);
        let doc = Document::load_mem(&canvas.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_long_table_paginates_in_document() {
        let mut canvas = PdfCanvas::new(PageGeometry::A4);
        let end_y = canvas.draw_table(&sample_table(150), 40.0);
        assert!(canvas.page_count() > 1);
        assert!(end_y > PageGeometry::A4.top_margin);
        let pages = canvas.page_count();
        let doc = Document::load_mem(&canvas.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), pages);
    }

    #[test]
    fn test_table_end_matches_shared_layout() {
        let table = sample_table(5);
        let mut canvas = PdfCanvas::new(PageGeometry::A4);
        let end_y = canvas.draw_table(&table, 60.0);
        assert_eq!(end_y, layout_table(&table, 60.0, &PageGeometry::A4).end_y);
    }
}
