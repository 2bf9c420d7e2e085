//! Document text and table extraction.
//!
//! Produces page text and page-segmented cell rows. Nothing in here knows
//! about deeds; the chain extractors consume [`ExtractedPage`] values only.

pub mod docx;
pub mod pdf;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub use self::pdf::PopplerTools;

/// Rows of cell strings for one detected table.
pub type PageTable = Vec<Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// 1-based page number within the source document.
    pub number: usize,
    pub text: String,
    pub tables: Vec<PageTable>,
}

impl ExtractedPage {
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.tables.iter().any(|table| !table.is_empty())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SourceKind {
    Pdf,
    Docx,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_label(path).as_str() {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| format!(".{}", value.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn extract_pages(
    path: &Path,
    kind: SourceKind,
    tools: &PopplerTools,
) -> Result<Vec<ExtractedPage>> {
    match kind {
        SourceKind::Pdf => pdf::extract_pdf_pages(path, tools),
        SourceKind::Docx => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let page = docx::extract_docx_page(&bytes)
                .with_context(|| format!("failed to read Word document {}", path.display()))?;
            Ok(vec![page])
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn source_kind_follows_extension_case_insensitively() {
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("abstract.PDF")),
            Some(SourceKind::Pdf)
        );
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("search.docx")),
            Some(SourceKind::Docx)
        );
        assert_eq!(SourceKind::from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(SourceKind::from_path(&PathBuf::from("no_extension")), None);
    }

    #[test]
    fn extension_label_keeps_the_dot() {
        assert_eq!(extension_label(&PathBuf::from("scan.TIFF")), ".tiff");
        assert_eq!(extension_label(&PathBuf::from("README")), "");
    }

    #[test]
    fn blank_pages_have_no_content() {
        let blank = ExtractedPage {
            number: 1,
            text: " \n\t".to_string(),
            tables: vec![Vec::new()],
        };
        assert!(!blank.has_content());

        let tabled = ExtractedPage {
            number: 2,
            text: String::new(),
            tables: vec![vec![vec!["GRANTOR".to_string()]]],
        };
        assert!(tabled.has_content());
    }
}
