//! PDF Access Layer (spec §4.A): render pages to text, words, tables, and
//! images. `PdfAccess` is a trait so Tiers 1–3 and the bank identifier
//! depend on an interface rather than the concrete parser, mirroring the
//! teacher's separation of `document::PdfDocument` from its `layout`/
//! `extractors` consumers — and letting tests build a page deck from
//! literal words instead of real PDF bytes.

pub mod container;
pub mod content;
pub mod decode;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod raster;
pub mod scan;
pub mod tables;

use crate::error::{Error, Result};
use crate::geometry::{y_bands, Word};
use container::Container;
use tables::TableGrid;

/// Read-only access to an open PDF's pages (spec §4.A).
pub trait PdfAccess {
    fn page_count(&self) -> usize;
    fn page_text(&self, page: usize) -> Result<String>;
    fn page_words(&self, page: usize) -> Result<Vec<Word>>;
    fn page_tables(&self, page: usize) -> Result<Vec<TableGrid>>;
    fn render_page(&self, page: usize, dpi: f32) -> Result<Vec<u8>>;

    fn pages_text(&self) -> Result<Vec<String>> {
        (0..self.page_count()).map(|p| self.page_text(p)).collect()
    }

    fn pages_words(&self) -> Result<Vec<Vec<Word>>> {
        (0..self.page_count()).map(|p| self.page_words(p)).collect()
    }

    fn pages_tables(&self) -> Result<Vec<Vec<TableGrid>>> {
        (0..self.page_count()).map(|p| self.page_tables(p)).collect()
    }

    fn is_scanned(&self) -> bool {
        self.pages_text()
            .map(|pages| scan::is_scanned(&pages))
            .unwrap_or(false)
    }
}

/// A real PDF backed by byte content, parsed through the container/lexer
/// machinery in this module.
pub struct Document {
    container: Container,
    pages: Vec<object::Dict>,
}

impl Document {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let container = Container::parse(bytes)?;
        let pages = container.pages()?;
        Ok(Self { container, pages })
    }

    fn page_dict(&self, page: usize) -> Result<&object::Dict> {
        self.pages.get(page).ok_or_else(|| Error::ParseError {
            offset: 0,
            reason: format!("page index {page} out of range"),
        })
    }

    fn content_bytes(&self, page: usize) -> Result<Vec<u8>> {
        let dict = self.page_dict(page)?;
        let contents = match dict.get("Contents") {
            Some(obj) => obj.clone(),
            None => return Ok(Vec::new()),
        };
        let mut out = Vec::new();
        let streams: Vec<object::Object> = match &contents {
            object::Object::Array(arr) => arr.clone(),
            other => vec![other.clone()],
        };
        for entry in streams {
            let resolved = self.container.resolve(&entry)?;
            if let Some((stream_dict, raw)) = resolved.as_stream() {
                let decoded = self.container.stream_data(stream_dict, raw)?;
                out.extend_from_slice(&decoded);
                out.push(b'\n');
            }
        }
        Ok(out)
    }

    fn words_for_page(&self, page: usize) -> Result<Vec<Word>> {
        let dict = self.page_dict(page)?;
        let (_, height) = raster::page_dimensions(dict);
        let content = self.content_bytes(page)?;
        Ok(content::extract_words(&content, height, page))
    }
}

impl PdfAccess for Document {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        let words = self.words_for_page(page)?;
        let bands = y_bands(&words, 4.0);
        let lines: Vec<String> = bands
            .iter()
            .map(|band| {
                band.iter()
                    .map(|&i| words[i].text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn page_words(&self, page: usize) -> Result<Vec<Word>> {
        self.words_for_page(page)
    }

    fn page_tables(&self, page: usize) -> Result<Vec<TableGrid>> {
        let words = self.words_for_page(page)?;
        Ok(tables::detect_tables(&words))
    }

    fn render_page(&self, page: usize, dpi: f32) -> Result<Vec<u8>> {
        let dict = self.page_dict(page)?;
        raster::render_page(&self.container, dict, dpi)
    }
}

/// In-memory `PdfAccess` built from literal data, used throughout the test
/// suite (SPEC_FULL §8: scenario/boundary tests are assembled from literal
/// `Word`/`TableGrid` values rather than synthesized PDF bytes).
#[derive(Default)]
pub struct FakePdfAccess {
    pub texts: Vec<String>,
    pub words: Vec<Vec<Word>>,
    pub tables: Vec<Vec<TableGrid>>,
    pub images: Vec<Vec<u8>>,
}

impl PdfAccess for FakePdfAccess {
    fn page_count(&self) -> usize {
        self.texts.len().max(self.words.len()).max(self.tables.len())
    }

    fn page_text(&self, page: usize) -> Result<String> {
        Ok(self.texts.get(page).cloned().unwrap_or_default())
    }

    fn page_words(&self, page: usize) -> Result<Vec<Word>> {
        Ok(self.words.get(page).cloned().unwrap_or_default())
    }

    fn page_tables(&self, page: usize) -> Result<Vec<TableGrid>> {
        Ok(self.tables.get(page).cloned().unwrap_or_default())
    }

    fn render_page(&self, page: usize, _dpi: f32) -> Result<Vec<u8>> {
        Ok(self.images.get(page).cloned().unwrap_or_default())
    }
}
