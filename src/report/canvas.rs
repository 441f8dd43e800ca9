//! Expense report drawn straight onto PDF pages.
//!
//! Coordinates are PDF points measured from the bottom-left corner of an A4
//! page. The layout is computed up front so the paging rules can be checked
//! without decoding a PDF.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use super::ReportError;
use crate::model::expense::Expense;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const TITLE_X: f32 = 200.0;
const TITLE_DROP: f32 = 50.0;
const HEADER_DROP: f32 = 100.0;
const ROW_STEP: f32 = 20.0;
/// Rows never go below this line; the next row starts a new page.
const BOTTOM_MARGIN: f32 = 50.0;
const CONTINUATION_DROP: f32 = 50.0;

const DATE_X: f32 = 50.0;
const CATEGORY_X: f32 = 150.0;
const DESCRIPTION_X: f32 = 300.0;
const AMOUNT_LABEL_X: f32 = 500.0;
const AMOUNT_RIGHT_EDGE: f32 = 550.0;

const TITLE_SIZE: f32 = 16.0;
const HEADER_SIZE: f32 = 12.0;
const ROW_SIZE: f32 = 10.0;

/// One printable row of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseLine {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: String,
}

impl From<&Expense> for ExpenseLine {
    fn from(expense: &Expense) -> Self {
        let description = expense.description.trim();
        Self {
            date: expense.date.to_string(),
            category: expense.display_category(),
            description: if description.is_empty() { "-".into() } else { description.to_string() },
            amount: format!("{:.2}", expense.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageLayout {
    pub items: Vec<TextItem>,
}

impl PageLayout {
    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, bold: bool) {
        self.items.push(TextItem {
            text: text.into(),
            x,
            y,
            size,
            bold,
        });
    }

    fn text_right(&mut self, text: &str, right_edge: f32, y: f32, size: f32) {
        let x = right_edge - helvetica_width(text, size);
        self.text(text, x, y, size, false);
    }
}

/// Approximate Helvetica advance width, good enough to right-align amounts.
fn helvetica_width(text: &str, size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            '0'..='9' => 0.556,
            '.' | ',' => 0.278,
            '-' => 0.333,
            ' ' => 0.278,
            _ => 0.5,
        })
        .sum();
    em * size
}

/// Places the title, headers and rows. A new page is opened only when another
/// row still has to be drawn, so there is never a trailing blank page.
pub fn layout(title: &str, lines: &[ExpenseLine]) -> Vec<PageLayout> {
    let mut pages = Vec::new();
    let mut page = PageLayout::default();

    page.text(title, TITLE_X, PAGE_HEIGHT - TITLE_DROP, TITLE_SIZE, true);

    let mut y = PAGE_HEIGHT - HEADER_DROP;
    page.text("Date", DATE_X, y, HEADER_SIZE, true);
    page.text("Category", CATEGORY_X, y, HEADER_SIZE, true);
    page.text("Description", DESCRIPTION_X, y, HEADER_SIZE, true);
    page.text("Amount", AMOUNT_LABEL_X, y, HEADER_SIZE, true);
    y -= ROW_STEP;

    for line in lines {
        if y < BOTTOM_MARGIN {
            pages.push(std::mem::take(&mut page));
            y = PAGE_HEIGHT - CONTINUATION_DROP;
        }

        page.text(line.date.as_str(), DATE_X, y, ROW_SIZE, false);
        page.text(line.category.as_str(), CATEGORY_X, y, ROW_SIZE, false);
        page.text(line.description.as_str(), DESCRIPTION_X, y, ROW_SIZE, false);
        page.text_right(&line.amount, AMOUNT_RIGHT_EDGE, y, ROW_SIZE);
        y -= ROW_STEP;
    }

    pages.push(page);
    pages
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn pdf_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Draws the laid out pages into a PDF document.
pub fn render(title: &str, pages: &[PageLayout]) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1")
        };

        let layer = doc.get_page(page_index).get_layer(layer_index);
        for item in &page.items {
            let font: &IndirectFontRef = if item.bold { &bold } else { &regular };
            layer.use_text(item.text.clone(), item.size, mm(item.x), mm(item.y), font);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

pub fn expense_report_pdf(expenses: &[Expense]) -> Result<Vec<u8>, ReportError> {
    let lines: Vec<ExpenseLine> = expenses.iter().map(ExpenseLine::from).collect();
    let pages = layout("Expense Report", &lines);
    tracing::debug!(rows = lines.len(), pages = pages.len(), "Rendering canvas expense report");
    render("Expense Report", &pages)
}
