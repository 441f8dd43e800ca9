//! PDF and HTML renderings of ledger data.

pub mod canvas;
pub mod converter;
pub mod html;

use derive_more::Display;

#[derive(Debug, Display)]
pub enum ReportError {
    #[display(fmt = "pdf rendering failed: {}", _0)]
    Pdf(String),

    #[display(fmt = "template rendering failed: {}", _0)]
    Template(tera::Error),

    #[display(fmt = "html to pdf conversion failed: {}", _0)]
    Converter(String),

    #[display(fmt = "i/o error: {}", _0)]
    Io(std::io::Error),
}

impl std::error::Error for ReportError {}

impl From<tera::Error> for ReportError {
    fn from(e: tera::Error) -> Self {
        ReportError::Template(e)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}
