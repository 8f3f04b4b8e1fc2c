//! Fixed A4 invoice layout.
//!
//! Produces a backend-neutral list of drawing operations per page. All
//! coordinates are PDF points measured from the top-left corner of the page;
//! text `y` is the baseline and text `x` is the left edge after alignment.

use crate::render::fonts::{text_width, truncate_text, wrap_text, Weight};
use crate::render::preview::InvoicePreview;
use crate::render::RenderSettings;
use crate::services::error::ServiceError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const LEFT: f32 = 60.0;
const CONTENT_WIDTH: f32 = 480.0;
const RIGHT: f32 = LEFT + CONTENT_WIDTH;
const CENTER: f32 = LEFT + CONTENT_WIDTH / 2.0;
const TOP: f32 = 60.0;
const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - 40.0;

const INFO_BAR_Y: f32 = 95.0;
const INFO_BAR_HEIGHT: f32 = 44.0;
const INFO_BAR_PADDING: f32 = 16.0;
/// Each side of the bar gets half its width, less padding and a gap.
const INFO_BAR_SIDE_WIDTH: f32 = CONTENT_WIDTH / 2.0 - INFO_BAR_PADDING - 8.0;
const EMAIL_PILL_PADDING: f32 = 12.0;

const ROW_HEIGHT: f32 = 28.0;
const ROW_BASELINE: f32 = 19.0;
const ROW_LINE_STEP: f32 = 14.0;
const COL_PRODUCT: f32 = LEFT + 16.0;
const COL_QUANTITY: f32 = LEFT + 220.0;
const COL_RATE: f32 = LEFT + 320.0;
const COL_AMOUNT: f32 = RIGHT - 16.0;
const PRODUCT_WIDTH: f32 = 180.0;

const TOTALS_GAP: f32 = 32.0;
const TOTALS_WIDTH: f32 = 210.0;
const TOTALS_HEIGHT: f32 = 80.0;

const FOOTER_GAP: f32 = 44.0;
const FOOTER_WIDTH: f32 = 420.0;
const FOOTER_TEXT_WIDTH: f32 = 400.0;
const FOOTER_LINE_STEP: f32 = 12.0;
const FOOTER_PADDING: f32 = 16.0;

const CELL_SIZE: f32 = 12.0;

pub const FOOTER_MESSAGE: &str = "We are pleased to provide any further information you may require and look forward to assisting with your next order. Rest assured, it will receive our prompt and dedicated attention.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const DARK: Color = Color::new(35, 35, 58);
pub const HIGHLIGHT: Color = Color::new(204, 245, 117);
pub const GRAND_TOTAL: Color = Color::new(37, 99, 235);
const WHITE: Color = Color::new(255, 255, 255);
const BLACK: Color = Color::new(0, 0, 0);
const ROW_SHADE: Color = Color::new(240, 240, 240);
const ROW_TEXT: Color = Color::new(60, 60, 60);
const TOTALS_TEXT: Color = Color::new(80, 80, 80);
const MUTED: Color = Color::new(120, 120, 120);
const RULE: Color = Color::new(220, 220, 220);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Product,
    Quantity,
    Rate,
    Amount,
}

/// What a piece of text is, so tests and backends need not guess from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextRole {
    Brand,
    Tagline,
    Title,
    IssuerLabel,
    IssuerName,
    Date,
    Email,
    TableHeader,
    Cell { row: usize, column: Column },
    SubtotalLabel,
    SubtotalValue,
    TaxLabel,
    TaxValue,
    GrandTotalLabel,
    GrandTotalValue,
    ClosingDate,
    Footer,
    PageNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextOp {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub weight: Weight,
    pub color: Color,
    pub role: TextRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text(TextOp),
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.pages.iter().flat_map(|p| p.texts())
    }

    pub fn texts_with_role(&self, role: TextRole) -> impl Iterator<Item = &TextOp> {
        self.texts().filter(move |t| t.role == role)
    }

    /// Number of distinct item rows in the table.
    pub fn row_count(&self) -> usize {
        self.texts()
            .filter_map(|t| match t.role {
                TextRole::Cell { row, .. } => Some(row),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// SHA-256 over the serialized drawing operations.
    pub fn content_hash(&self) -> Result<String, ServiceError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| ServiceError::Render(format!("Failed to serialize layout: {}", e)))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

struct TextStyle {
    size: f32,
    weight: Weight,
    color: Color,
}

impl TextStyle {
    const fn new(size: f32, weight: Weight, color: Color) -> Self {
        Self {
            size,
            weight,
            color,
        }
    }
}

#[derive(Default)]
struct PageBuilder {
    finished: Vec<Page>,
    current: Page,
}

impl PageBuilder {
    fn text(
        &mut self,
        content: &str,
        anchor_x: f32,
        y: f32,
        align: Align,
        style: &TextStyle,
        role: TextRole,
    ) {
        let width = text_width(content, style.size, style.weight);
        let x = match align {
            Align::Left => anchor_x,
            Align::Center => anchor_x - width / 2.0,
            Align::Right => anchor_x - width,
        };
        self.current.ops.push(DrawOp::Text(TextOp {
            x,
            y,
            size: style.size,
            weight: style.weight,
            color: style.color,
            role,
            content: content.to_string(),
        }));
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.current.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn stroke(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.current.ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32, color: Color) {
        self.current.ops.push(DrawOp::Rule {
            x1,
            y1: y,
            x2,
            y2: y,
            color,
        });
    }

    fn new_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.current));
    }

    fn finish(mut self) -> Document {
        self.finished.push(self.current);
        Document {
            pages: self.finished,
        }
    }
}

/// Lay out `preview` on as many A4 pages as needed.
pub fn layout_document(preview: &InvoicePreview, settings: &RenderSettings) -> Document {
    let mut pages = PageBuilder::default();

    draw_header(&mut pages, settings);
    draw_info_bar(&mut pages, preview);

    let table_top = INFO_BAR_Y + INFO_BAR_HEIGHT + 24.0;
    draw_table_header(&mut pages, table_top);
    let mut y = table_top + ROW_HEIGHT;

    let cell = TextStyle::new(CELL_SIZE, Weight::Regular, ROW_TEXT);
    for row in &preview.rows {
        let name_lines = wrap_text(&row.name, CELL_SIZE, Weight::Regular, PRODUCT_WIDTH);
        let height = ROW_HEIGHT + (name_lines.len().saturating_sub(1)) as f32 * ROW_LINE_STEP;

        if y + height > BOTTOM_LIMIT && y > TOP + ROW_HEIGHT {
            pages.new_page();
            draw_table_header(&mut pages, TOP);
            y = TOP + ROW_HEIGHT;
        }

        if row.index % 2 == 1 {
            pages.fill(LEFT, y, CONTENT_WIDTH, height, ROW_SHADE);
        }

        let baseline = y + ROW_BASELINE;
        for (i, line) in name_lines.iter().enumerate() {
            pages.text(
                line,
                COL_PRODUCT,
                baseline + i as f32 * ROW_LINE_STEP,
                Align::Left,
                &cell,
                TextRole::Cell {
                    row: row.index,
                    column: Column::Product,
                },
            );
        }
        pages.text(
            &row.quantity,
            COL_QUANTITY,
            baseline,
            Align::Center,
            &cell,
            TextRole::Cell {
                row: row.index,
                column: Column::Quantity,
            },
        );
        pages.text(
            &row.rate,
            COL_RATE,
            baseline,
            Align::Right,
            &cell,
            TextRole::Cell {
                row: row.index,
                column: Column::Rate,
            },
        );
        pages.text(
            &row.amount,
            COL_AMOUNT,
            baseline,
            Align::Right,
            &cell,
            TextRole::Cell {
                row: row.index,
                column: Column::Amount,
            },
        );

        y += height;
    }

    // An empty table still reserves one row.
    if preview.rows.is_empty() {
        y += ROW_HEIGHT;
    }

    let footer_lines = wrap_text(FOOTER_MESSAGE, 10.0, Weight::Regular, FOOTER_TEXT_WIDTH);
    let footer_height = FOOTER_PADDING + footer_lines.len() as f32 * FOOTER_LINE_STEP;
    let closing_height = TOTALS_GAP + TOTALS_HEIGHT + FOOTER_GAP + footer_height;

    // Totals, closing date and footer always share a page.
    let totals_top = if y + closing_height > BOTTOM_LIMIT {
        pages.new_page();
        TOP
    } else {
        y + TOTALS_GAP
    };

    draw_totals(&mut pages, preview, totals_top);
    draw_closing(&mut pages, preview, totals_top + TOTALS_HEIGHT, &footer_lines, footer_height);

    let mut document = pages.finish();
    number_pages(&mut document);
    document
}

fn draw_header(pages: &mut PageBuilder, settings: &RenderSettings) {
    pages.text(
        &settings.brand,
        LEFT,
        TOP,
        Align::Left,
        &TextStyle::new(22.0, Weight::Bold, BLACK),
        TextRole::Brand,
    );
    if !settings.tagline.is_empty() {
        pages.text(
            &settings.tagline,
            LEFT,
            TOP + 15.0,
            Align::Left,
            &TextStyle::new(10.0, Weight::Regular, MUTED),
            TextRole::Tagline,
        );
    }
    pages.text(
        &settings.title,
        RIGHT,
        TOP,
        Align::Right,
        &TextStyle::new(18.0, Weight::Bold, BLACK),
        TextRole::Title,
    );
}

fn draw_info_bar(pages: &mut PageBuilder, preview: &InvoicePreview) {
    pages.fill(LEFT, INFO_BAR_Y, CONTENT_WIDTH, INFO_BAR_HEIGHT, DARK);

    pages.text(
        "Name",
        LEFT + INFO_BAR_PADDING,
        INFO_BAR_Y + 16.0,
        Align::Left,
        &TextStyle::new(12.0, Weight::Bold, WHITE),
        TextRole::IssuerLabel,
    );
    pages.text(
        &truncate_text(&preview.issuer_name, 16.0, Weight::Bold, INFO_BAR_SIDE_WIDTH),
        LEFT + INFO_BAR_PADDING,
        INFO_BAR_Y + 34.0,
        Align::Left,
        &TextStyle::new(16.0, Weight::Bold, HIGHLIGHT),
        TextRole::IssuerName,
    );
    pages.text(
        &format!("Date: {}", preview.date),
        RIGHT - INFO_BAR_PADDING,
        INFO_BAR_Y + 16.0,
        Align::Right,
        &TextStyle::new(10.0, Weight::Regular, WHITE),
        TextRole::Date,
    );

    let email_style = TextStyle::new(10.0, Weight::Regular, BLACK);
    let email = truncate_text(
        &preview.issuer_email,
        email_style.size,
        email_style.weight,
        INFO_BAR_SIDE_WIDTH - 2.0 * EMAIL_PILL_PADDING,
    );
    let pill_width = text_width(&email, email_style.size, email_style.weight)
        + 2.0 * EMAIL_PILL_PADDING;
    let pill_top = INFO_BAR_Y + INFO_BAR_HEIGHT - 28.0;
    pages.fill(
        RIGHT - INFO_BAR_PADDING - pill_width,
        pill_top,
        pill_width,
        22.0,
        WHITE,
    );
    pages.text(
        &email,
        RIGHT - INFO_BAR_PADDING - pill_width / 2.0,
        pill_top + 14.0,
        Align::Center,
        &email_style,
        TextRole::Email,
    );
}

fn draw_table_header(pages: &mut PageBuilder, top: f32) {
    pages.fill(LEFT, top, CONTENT_WIDTH, ROW_HEIGHT, DARK);
    let style = TextStyle::new(CELL_SIZE, Weight::Bold, WHITE);
    let baseline = top + ROW_BASELINE;
    pages.text("Product", COL_PRODUCT, baseline, Align::Left, &style, TextRole::TableHeader);
    pages.text("Qty", COL_QUANTITY, baseline, Align::Center, &style, TextRole::TableHeader);
    pages.text("Rate", COL_RATE, baseline, Align::Right, &style, TextRole::TableHeader);
    pages.text(
        "Total Amount",
        COL_AMOUNT,
        baseline,
        Align::Right,
        &style,
        TextRole::TableHeader,
    );
}

fn draw_totals(pages: &mut PageBuilder, preview: &InvoicePreview, top: f32) {
    let left = RIGHT - TOTALS_WIDTH;
    pages.stroke(left, top, TOTALS_WIDTH, TOTALS_HEIGHT, RULE);

    let charges = TextStyle::new(12.0, Weight::Regular, TOTALS_TEXT);
    pages.text("Total Charges", left + 16.0, top + 24.0, Align::Left, &charges, TextRole::SubtotalLabel);
    pages.text(&preview.subtotal, RIGHT - 16.0, top + 24.0, Align::Right, &charges, TextRole::SubtotalValue);

    let tax = TextStyle::new(12.0, Weight::Regular, MUTED);
    pages.text(&preview.tax_label, left + 16.0, top + 42.0, Align::Left, &tax, TextRole::TaxLabel);
    pages.text(&preview.tax, RIGHT - 16.0, top + 42.0, Align::Right, &tax, TextRole::TaxValue);

    pages.rule(left + 16.0, RIGHT - 16.0, top + 50.0, RULE);

    let grand = TextStyle::new(14.0, Weight::Bold, GRAND_TOTAL);
    pages.text("Total Amount", left + 16.0, top + 68.0, Align::Left, &grand, TextRole::GrandTotalLabel);
    pages.text(
        &preview.grand_total,
        RIGHT - 16.0,
        top + 68.0,
        Align::Right,
        &grand,
        TextRole::GrandTotalValue,
    );
}

fn draw_closing(
    pages: &mut PageBuilder,
    preview: &InvoicePreview,
    totals_bottom: f32,
    footer_lines: &[String],
    footer_height: f32,
) {
    pages.text(
        &format!("Date: {}", preview.date),
        LEFT,
        totals_bottom + 24.0,
        Align::Left,
        &TextStyle::new(10.0, Weight::Regular, MUTED),
        TextRole::ClosingDate,
    );

    let footer_top = totals_bottom + FOOTER_GAP;
    let footer_left = LEFT + (CONTENT_WIDTH - FOOTER_WIDTH) / 2.0;
    pages.fill(footer_left, footer_top, FOOTER_WIDTH, footer_height, DARK);

    let style = TextStyle::new(10.0, Weight::Regular, WHITE);
    for (i, line) in footer_lines.iter().enumerate() {
        pages.text(
            line,
            CENTER,
            footer_top + FOOTER_PADDING + i as f32 * FOOTER_LINE_STEP,
            Align::Center,
            &style,
            TextRole::Footer,
        );
    }
}

fn number_pages(document: &mut Document) {
    let total = document.pages.len();
    if total < 2 {
        return;
    }
    let style = TextStyle::new(9.0, Weight::Regular, MUTED);
    for (i, page) in document.pages.iter_mut().enumerate() {
        let label = format!("Page {} of {}", i + 1, total);
        let width = text_width(&label, style.size, style.weight);
        page.ops.push(DrawOp::Text(TextOp {
            x: CENTER - width / 2.0,
            y: PAGE_HEIGHT - 20.0,
            size: style.size,
            weight: style.weight,
            color: style.color,
            role: TextRole::PageNumber,
            content: label,
        }));
    }
}
