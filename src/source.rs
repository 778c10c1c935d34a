use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// One table cell; `None` mirrors the null cells digital extraction produces.
pub type Row = Vec<Option<String>>;
pub type Table = Vec<Row>;

/// Per-page input contract from the document source collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub page_number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl PageContent {
    /// Placeholder for a page whose content could not be produced.
    pub fn empty(page_number: u32) -> PageContent {
        PageContent { page_number, text: String::new(), tables: Vec::new() }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// Fatal: the document itself cannot be opened or read.
    #[error("cannot open document {path}: {reason}")]
    Unreadable { path: String, reason: String },
    /// Per-page: skip the page and continue with the rest.
    #[error("page {page} unavailable: {reason}")]
    PageUnavailable { page: u32, reason: String },
}

/// Document source collaborator: page-segmented text plus table grids.
pub trait DocumentSource: Sync {
    fn page_count(&self) -> usize;
    /// Fetch a page by 1-based number.
    fn page(&self, number: u32) -> Result<PageContent, SourceError>;
}

/// Collect pages in document order. An unavailable page is logged and
/// recorded as empty (zero candidates) rather than aborting the run.
pub fn collect_pages(source: &dyn DocumentSource, limit: Option<usize>) -> Vec<PageContent> {
    let count = match limit {
        Some(n) => source.page_count().min(n),
        None => source.page_count(),
    };

    (1..=count as u32)
        .map(|number| match source.page(number) {
            Ok(page) => page,
            Err(e) => {
                warn!(page = number, error = %e, "page unavailable, recording as empty");
                PageContent::empty(number)
            }
        })
        .collect()
}

/// Pre-extracted page dump: a JSON array of `PageContent`, produced by an
/// upstream digital-extraction step that also recovers table grids.
pub struct DumpSource {
    pages: Vec<PageContent>,
}

impl DumpSource {
    pub fn open(path: &Path) -> Result<DumpSource, SourceError> {
        let unreadable = |reason: String| SourceError::Unreadable {
            path: path.display().to_string(),
            reason,
        };
        let data = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let pages: Vec<PageContent> =
            serde_json::from_str(&data).map_err(|e| unreadable(e.to_string()))?;
        Ok(DumpSource { pages })
    }
}

impl DocumentSource for DumpSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: u32) -> Result<PageContent, SourceError> {
        self.pages
            .iter()
            .find(|p| p.page_number == number)
            .cloned()
            .ok_or(SourceError::PageUnavailable {
                page: number,
                reason: "missing from dump".to_string(),
            })
    }
}

/// Digitally-born PDF: per-page text via lopdf. Table grids are not
/// recoverable from raw content streams, so this source yields text only.
pub struct PdfSource {
    doc: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfSource {
    pub fn open(path: &Path) -> Result<PdfSource, SourceError> {
        let doc = lopdf::Document::load(path).map_err(|e| SourceError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(PdfSource { doc, page_numbers })
    }
}

impl DocumentSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page(&self, number: u32) -> Result<PageContent, SourceError> {
        let unavailable = |reason: String| SourceError::PageUnavailable { page: number, reason };
        let pdf_page = (number as usize)
            .checked_sub(1)
            .and_then(|i| self.page_numbers.get(i))
            .copied()
            .ok_or_else(|| unavailable("out of range".to_string()))?;
        let text = self
            .doc
            .extract_text(&[pdf_page])
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(PageContent { page_number: number, text, tables: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_fixture_loads() {
        let src = DumpSource::open(Path::new("tests/fixtures/j6l_pages.json")).unwrap();
        assert_eq!(src.page_count(), 3);
        let p2 = src.page(2).unwrap();
        assert_eq!(p2.page_number, 2);
        assert!(!p2.tables.is_empty());
    }

    #[test]
    fn missing_page_is_per_page_error() {
        let src = DumpSource::open(Path::new("tests/fixtures/j6l_pages.json")).unwrap();
        assert!(matches!(src.page(99), Err(SourceError::PageUnavailable { page: 99, .. })));
    }

    #[test]
    fn collect_pages_degrades_missing_to_empty() {
        struct Holey;
        impl DocumentSource for Holey {
            fn page_count(&self) -> usize {
                3
            }
            fn page(&self, number: u32) -> Result<PageContent, SourceError> {
                if number == 2 {
                    Err(SourceError::PageUnavailable { page: 2, reason: "boom".into() })
                } else {
                    Ok(PageContent { page_number: number, text: "连接器".into(), tables: vec![] })
                }
            }
        }
        let pages = collect_pages(&Holey, None);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].text.is_empty());
        assert_eq!(pages[1].page_number, 2);
    }

    #[test]
    fn collect_pages_honors_limit() {
        let src = DumpSource::open(Path::new("tests/fixtures/j6l_pages.json")).unwrap();
        assert_eq!(collect_pages(&src, Some(1)).len(), 1);
    }

    #[test]
    fn unreadable_dump_is_fatal() {
        assert!(matches!(
            DumpSource::open(Path::new("tests/fixtures/nope.json")),
            Err(SourceError::Unreadable { .. })
        ));
    }
}
