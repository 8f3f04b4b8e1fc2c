//! PDF backend for the invoice layout, built on printpdf's standard fonts.

use crate::render::fonts::Weight;
use crate::render::layout::{Color, Document, DrawOp, PAGE_HEIGHT, PAGE_WIDTH};
use crate::services::error::ServiceError;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect, Rgb,
};
use std::io::BufWriter;

const RULE_THICKNESS: f32 = 0.75;

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Flip a top-left y coordinate into PDF's bottom-left space.
fn flip(y: f32) -> Mm {
    mm(PAGE_HEIGHT - y)
}

fn pdf_color(color: Color) -> printpdf::Color {
    printpdf::Color::Rgb(Rgb::new(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        None,
    ))
}

/// The standard fonts only cover Latin-1.
fn encodable(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

pub fn write_pdf(document: &Document, title: &str) -> Result<Vec<u8>, ServiceError> {
    let (pdf, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");

    let fonts = Fonts {
        regular: pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ServiceError::Render(e.to_string()))?,
        bold: pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ServiceError::Render(e.to_string()))?,
    };

    for (index, page) in document.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(
                mm(PAGE_WIDTH),
                mm(PAGE_HEIGHT),
                format!("Layer {}", index + 1),
            )
        };
        let layer = pdf.get_page(page_index).get_layer(layer_index);

        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer)
        .map_err(|e| ServiceError::Render(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ServiceError::Render(e.to_string()))
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::Text(text) => {
            layer.set_fill_color(pdf_color(text.color));
            layer.use_text(
                encodable(&text.content),
                text.size,
                mm(text.x),
                flip(text.y),
                fonts.get(text.weight),
            );
        }
        DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        } => {
            layer.set_fill_color(pdf_color(*color));
            layer.add_rect(
                Rect::new(mm(*x), flip(y + height), mm(x + width), flip(*y))
                    .with_mode(PaintMode::Fill),
            );
        }
        DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(RULE_THICKNESS);
            layer.add_rect(
                Rect::new(mm(*x), flip(y + height), mm(x + width), flip(*y))
                    .with_mode(PaintMode::Stroke),
            );
        }
        DrawOp::Rule {
            x1,
            y1,
            x2,
            y2,
            color,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(RULE_THICKNESS);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(*x1), flip(*y1)), false),
                    (Point::new(mm(*x2), flip(*y2)), false),
                ],
                is_closed: false,
            });
        }
    }
}
