//! Invoice PDF renderer.
//!
//! Pure transformation from a persisted invoice to PDF bytes: a centered
//! title, client and date lines, a Description/Qty/Price/Total table in
//! line-item order, and a right-aligned grand total. Item rows that do not
//! fit the page flow onto continuation pages with the column header
//! repeated. The document only ever exists in memory.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

use crate::invoice::models::Invoice;

// US Letter with 50pt margins, matching the layout the frontend was built
// against.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;

const TITLE_SIZE: f32 = 25.0;
const META_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TOTAL_SIZE: f32 = 12.0;
const ROW_STEP: f32 = 20.0;

// Column anchors. Description is left-aligned, qty centered in its column,
// price and total right-aligned against their column edges.
const DESC_X: f32 = 50.0;
const QTY_X: f32 = 300.0;
const QTY_WIDTH: f32 = 50.0;
const PRICE_RIGHT: f32 = 450.0;
const TOTAL_RIGHT: f32 = PAGE_WIDTH - MARGIN;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Errors that can occur while drawing or serializing the document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode page content: {0}")]
    Content(String),
    #[error("failed to serialize PDF document: {0}")]
    Serialize(String),
}

/// Render an invoice to PDF bytes.
pub fn render_invoice(invoice: &Invoice) -> Result<Vec<u8>, RenderError> {
    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops: Vec<Operation> = Vec::new();

    let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;
    let title = "Invoice";
    draw_text(
        &mut ops,
        BOLD,
        TITLE_SIZE,
        (PAGE_WIDTH - text_width(title, TITLE_SIZE)) / 2.0,
        y,
        title,
    );
    y -= TITLE_SIZE + 10.0;

    draw_text(
        &mut ops,
        REGULAR,
        META_SIZE,
        DESC_X,
        y,
        &format!("Client Name: {}", invoice.client_name),
    );
    y -= META_SIZE + 4.0;
    draw_text(
        &mut ops,
        REGULAR,
        META_SIZE,
        DESC_X,
        y,
        &format!("Invoice Date: {}", invoice.invoice_date.format("%Y-%m-%d")),
    );
    y -= META_SIZE + 16.0;

    y = draw_table_header(&mut ops, y);

    for item in invoice.line_items.iter() {
        if y < MARGIN + ROW_STEP {
            pages.push(std::mem::take(&mut ops));
            y = PAGE_HEIGHT - MARGIN - BODY_SIZE;
            y = draw_table_header(&mut ops, y);
        }

        draw_text(&mut ops, REGULAR, BODY_SIZE, DESC_X, y, &item.description);
        let qty = item.qty.to_string();
        draw_text(
            &mut ops,
            REGULAR,
            BODY_SIZE,
            QTY_X + (QTY_WIDTH - text_width(&qty, BODY_SIZE)) / 2.0,
            y,
            &qty,
        );
        draw_amount(&mut ops, BODY_SIZE, PRICE_RIGHT, y, item.price);
        draw_amount(&mut ops, BODY_SIZE, TOTAL_RIGHT, y, item.total);
        y -= ROW_STEP;
    }

    let rule_y = y + ROW_STEP - 8.0;
    draw_rule(&mut ops, rule_y);
    y = rule_y - ROW_STEP - 4.0;

    if y < MARGIN {
        pages.push(std::mem::take(&mut ops));
        y = PAGE_HEIGHT - MARGIN - TOTAL_SIZE;
    }
    let grand_total = format!("Grand Total: {}", format_amount(invoice.grand_total));
    draw_text(
        &mut ops,
        BOLD,
        TOTAL_SIZE,
        TOTAL_RIGHT - text_width(&grand_total, TOTAL_SIZE),
        y,
        &grand_total,
    );

    pages.push(ops);
    build_document(pages)
}

/// Two-decimal display form used for every monetary field
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn draw_table_header(ops: &mut Vec<Operation>, y: f32) -> f32 {
    draw_text(ops, BOLD, BODY_SIZE, DESC_X, y, "Description");
    draw_text(
        ops,
        BOLD,
        BODY_SIZE,
        QTY_X + (QTY_WIDTH - text_width("Qty", BODY_SIZE)) / 2.0,
        y,
        "Qty",
    );
    draw_text(
        ops,
        BOLD,
        BODY_SIZE,
        PRICE_RIGHT - text_width("Price", BODY_SIZE),
        y,
        "Price",
    );
    draw_text(
        ops,
        BOLD,
        BODY_SIZE,
        TOTAL_RIGHT - text_width("Total", BODY_SIZE),
        y,
        "Total",
    );
    draw_rule(ops, y - 6.0);
    y - ROW_STEP
}

// Coordinates and sizes are emitted as whole points
fn pt(v: f32) -> Object {
    (v.round() as i64).into()
}

fn draw_text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), pt(size)]));
    ops.push(Operation::new("Td", vec![pt(x), pt(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn draw_amount(ops: &mut Vec<Operation>, size: f32, right_edge: f32, y: f32, value: f64) {
    let text = format_amount(value);
    let x = right_edge - text_width(&text, size);
    draw_text(ops, REGULAR, size, x, y, &text);
}

fn draw_rule(ops: &mut Vec<Operation>, y: f32) {
    ops.push(Operation::new("w", vec![1.into()]));
    ops.push(Operation::new("m", vec![pt(DESC_X), pt(y)]));
    ops.push(Operation::new("l", vec![pt(PAGE_WIDTH - MARGIN), pt(y)]));
    ops.push(Operation::new("S", vec![]));
}

// Rough Helvetica advance widths in 1/1000 em. Digits are exact; letters
// are bucketed, which is close enough for centering short labels and
// right-aligning numerals.
fn char_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 278.0,
        'f' | 't' | 'r' | ' ' | '(' | ')' | '[' | ']' | '/' | '-' => 333.0,
        'm' | 'M' | 'W' => 889.0,
        'w' => 722.0,
        c if c.is_ascii_uppercase() => 689.0,
        _ => 556.0,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size / 1000.0
}

fn build_document(pages_ops: Vec<Vec<Operation>>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => font_regular,
            BOLD => font_bold,
        },
    });

    let page_count = pages_ops.len();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for ops in pages_ops {
        let content = Content { operations: ops };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Content(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), pt(PAGE_WIDTH), pt(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
    Ok(buf)
}
