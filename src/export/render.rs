//! Per-inspection PDF rendering
//!
//! Each inspection becomes a self-contained A4 document: a header block
//! with the vehicle and inspector, a paginated checklist table and a
//! footer. Every page carries its own resources and media box so pages
//! survive being moved into a merged document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::template::Layout;
use super::types::{InspectionItem, InspectionRecord, ItemStatus};
use crate::error::{AppError, Result};

/// A4 portrait in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;

/// First table row baseline
const TABLE_TOP: i64 = 660;

const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Renders one inspection into a standalone document
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, record: &InspectionRecord, items: &[InspectionItem]) -> Result<Vec<u8>>;
}

/// lopdf-backed renderer using the built-in Helvetica faces
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, record: &InspectionRecord, items: &[InspectionItem]) -> Result<Vec<u8>> {
        if items.is_empty() {
            return Err(render_failure(record, "inspection has no checklist items"));
        }

        let layout = Layout::classify(record.template_key());
        let pages: Vec<&[InspectionItem]> = items.chunks(layout.rows_per_page()).collect();
        let page_count = pages.len();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = add_fonts(&mut doc);

        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for (index, rows) in pages.iter().enumerate() {
            let content = page_content(record, layout, rows, index + 1, page_count);
            let encoded = content
                .encode()
                .map_err(|e| render_failure(record, &e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => media_box(),
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count as i64),
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
            .map_err(|e| render_failure(record, &e.to_string()))?;
        Ok(buffer)
    }
}

fn render_failure(record: &InspectionRecord, reason: &str) -> AppError {
    AppError::RenderFailure {
        id: record.id.clone(),
        reason: reason.to_string(),
    }
}

fn media_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(PAGE_WIDTH),
        Object::Integer(PAGE_HEIGHT),
    ])
}

fn add_fonts(doc: &mut Document) -> ObjectId {
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    })
}

fn page_content(
    record: &InspectionRecord,
    layout: Layout,
    rows: &[InspectionItem],
    page_number: usize,
    page_count: usize,
) -> Content {
    let mut ops = Vec::new();

    header(&mut ops, record, layout);
    table(&mut ops, layout, rows);

    let footer = format!("Inspection {}  |  Page {} of {}", record.id, page_number, page_count);
    text(&mut ops, "F1", 8, MARGIN, 30, &footer, 110);

    Content { operations: ops }
}

fn header(ops: &mut Vec<Operation>, record: &InspectionRecord, layout: Layout) {
    text(ops, "F2", 16, MARGIN, 790, layout.title(), 60);

    let period = match record.inspection_end_date {
        Some(end) if end != record.inspection_date => format!(
            "{} to {}",
            record.inspection_date.format("%d/%m/%Y"),
            end.format("%d/%m/%Y")
        ),
        _ => record.inspection_date.format("%d/%m/%Y").to_string(),
    };
    let category = record.template_key();
    let mileage = record
        .mileage
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = [
        format!("Vehicle: {}", record.vehicle_reg),
        format!("Category: {}", if category.is_empty() { "-" } else { category }),
        format!("Date: {}", period),
        format!("Inspector: {}", record.inspector_name),
        format!("Status: {}    Mileage: {}", record.status, mileage),
    ];
    let mut y = 762;
    for line in &lines {
        text(ops, "F1", 10, MARGIN, y, line, 90);
        y -= 14;
    }

    if let Some(comments) = record.comments.as_deref().filter(|c| !c.trim().is_empty()) {
        text(ops, "F1", 9, MARGIN, y - 4, &format!("Comments: {}", comments), 100);
    }

    rule(ops, 680);
}

fn table(ops: &mut Vec<Operation>, layout: Layout, rows: &[InspectionItem]) {
    let columns = layout.columns();
    for (heading, x) in columns {
        text(ops, "F2", 9, *x, TABLE_TOP + 6, heading, 20);
    }
    rule(ops, TABLE_TOP);

    let mut y = TABLE_TOP - layout.row_height();
    for item in rows {
        let mut cells: Vec<String> = vec![item.item_number.to_string()];
        if layout.shows_day_column() {
            cells.push(day_label(item.day_of_week).to_string());
        }
        cells.push(item.description.clone());
        cells.push(item.status.label().to_string());
        cells.push(item.comments.clone().unwrap_or_default());

        for (index, (cell, (_, x))) in cells.iter().zip(columns.iter()).enumerate() {
            let font = if index == cells.len() - 2 && item.status == ItemStatus::Defect {
                "F2"
            } else {
                "F1"
            };
            let width = column_width(columns, index);
            text(ops, font, 9, *x, y, cell, width);
        }
        y -= layout.row_height();
    }
}

/// Rough character budget for a column at 9pt Helvetica
fn column_width(columns: &[(&str, i64)], index: usize) -> usize {
    let start = columns[index].1;
    let end = columns
        .get(index + 1)
        .map(|(_, x)| *x)
        .unwrap_or(PAGE_WIDTH - MARGIN);
    ((end - start - 6).max(10) / 5) as usize
}

fn day_label(day: Option<i64>) -> &'static str {
    match day {
        Some(d @ 1..=7) => DAY_LABELS[(d - 1) as usize],
        _ => "-",
    }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, value: &str, max_chars: usize) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]));
    ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(pdf_text(value, max_chars))]));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new("w", vec![Object::Real(0.5)]));
    ops.push(Operation::new("m", vec![Object::Integer(MARGIN), Object::Integer(y)]));
    ops.push(Operation::new("l", vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)]));
    ops.push(Operation::new("S", vec![]));
}

/// Standard 14 fonts only cover Latin-1; keep to printable ASCII and truncate.
fn pdf_text(value: &str, max_chars: usize) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\n' | '\r' | '\t' => ' ',
            _ => '?',
        })
        .collect();

    if cleaned.chars().count() <= max_chars {
        cleaned
    } else {
        let mut truncated: String = cleaned.chars().take(max_chars.saturating_sub(3)).collect();
        truncated.push_str("...");
        truncated
    }
}
