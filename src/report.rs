//! Session report — fixed-layout PDF of accumulated diagnoses.
//!
//! Layout (PDF points, origin bottom-left, US-Letter 612×792):
//! - Title "Medical Prediction Report", Helvetica-Bold 16, at (200, 742)
//! - One line per result, "{disease}: {diagnosis}", Helvetica 12, at x = 80
//!   starting from y = 692 and moving down 30pt per entry
//!
//! An entry that would sit below the 50pt bottom margin starts a new page;
//! continuation pages carry no title and begin at y = 742. Reports that fit
//! on one page are exactly the fixed layout above.
//!
//! Layout is planned first (pure, testable) and then rendered via `printpdf`
//! entirely in memory. An empty snapshot is rejected; no document is made.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;
use thiserror::Error;

use crate::session::ResultSnapshot;

pub const REPORT_TITLE: &str = "Medical Prediction Report";
pub const MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_FILENAME: &str = "medical_report.pdf";

const LAYER_NAME: &str = "Layer 1";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No results to report")]
    EmptyResults,

    #[error("Invalid report file name '{0}': must be a plain file name")]
    InvalidFilename(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Cannot write report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ═══════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════

/// Page geometry and typography, in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub title_x: f32,
    /// Distance of the title baseline below the top edge.
    pub title_offset: f32,
    pub title_size: f32,
    pub entry_x: f32,
    /// Distance of the first entry below the top edge on the first page.
    pub first_entry_offset: f32,
    /// Distance of the first entry below the top edge on later pages.
    pub continuation_offset: f32,
    pub line_step: f32,
    pub entry_size: f32,
    pub bottom_margin: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            title_x: 200.0,
            title_offset: 50.0,
            title_size: 16.0,
            entry_x: 80.0,
            first_entry_offset: 100.0,
            continuation_offset: 50.0,
            line_step: 30.0,
            entry_size: 12.0,
            bottom_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Regular,
    Bold,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub style: FontStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
}

// ═══════════════════════════════════════════════════════════
// Document
// ═══════════════════════════════════════════════════════════

/// Rendered report handed to the caller.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

impl ReportDocument {
    pub fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    /// Write the PDF into `dir` (created if needed) and return its path.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        check_filename(&self.filename)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "Report saved");
        Ok(path)
    }
}

// ═══════════════════════════════════════════════════════════
// Generator
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    layout: ReportLayout,
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: ReportLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Position every line of the report, page by page.
    pub fn plan(&self, snapshot: &ResultSnapshot) -> Result<Vec<PageLayout>, ReportError> {
        if snapshot.is_empty() {
            return Err(ReportError::EmptyResults);
        }
        let l = &self.layout;

        let mut pages = vec![PageLayout {
            lines: vec![TextLine {
                text: REPORT_TITLE.to_string(),
                x: l.title_x,
                y: l.page_height - l.title_offset,
                size: l.title_size,
                style: FontStyle::Bold,
            }],
        }];

        let mut y = l.page_height - l.first_entry_offset;
        for entry in snapshot.entries() {
            if y < l.bottom_margin {
                pages.push(PageLayout::default());
                y = l.page_height - l.continuation_offset;
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(TextLine {
                    text: format!("{}: {}", entry.disease_id, entry.diagnosis),
                    x: l.entry_x,
                    y,
                    size: l.entry_size,
                    style: FontStyle::Regular,
                });
            }
            y -= l.line_step;
        }

        Ok(pages)
    }

    /// Render `snapshot` to PDF bytes named [`DEFAULT_FILENAME`].
    pub fn generate(&self, snapshot: &ResultSnapshot) -> Result<ReportDocument, ReportError> {
        self.generate_named(snapshot, DEFAULT_FILENAME)
    }

    /// Render `snapshot` to PDF bytes with a caller-chosen file name.
    pub fn generate_named(
        &self,
        snapshot: &ResultSnapshot,
        filename: &str,
    ) -> Result<ReportDocument, ReportError> {
        check_filename(filename)?;
        let pages = self.plan(snapshot)?;
        let bytes = self.render(&pages)?;
        tracing::info!(
            entries = snapshot.len(),
            pages = pages.len(),
            bytes = bytes.len(),
            "Report generated"
        );
        Ok(ReportDocument {
            bytes,
            filename: filename.to_string(),
            page_count: pages.len(),
        })
    }

    fn render(&self, pages: &[PageLayout]) -> Result<Vec<u8>, ReportError> {
        let width = pt(self.layout.page_width);
        let height = pt(self.layout.page_height);

        let (doc, first_page, first_layer) = PdfDocument::new(REPORT_TITLE, width, height, LAYER_NAME);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

        for (index, page) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(width, height, LAYER_NAME);
                doc.get_page(page_index).get_layer(layer_index)
            };
            draw_page(&layer, page, &regular, &bold);
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
    }
}

/// The name must stay inside whatever directory the report is saved to.
fn check_filename(name: &str) -> Result<(), ReportError> {
    let plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if name.is_empty() || !plain {
        return Err(ReportError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for line in &page.lines {
        let font = match line.style {
            FontStyle::Regular => regular,
            FontStyle::Bold => bold,
        };
        layer.use_text(line.text.as_str(), line.size, pt(line.x), pt(line.y), font);
    }
}

/// Points → millimetres.
fn pt(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}
