//! Text extraction: turns uploaded file bytes into cleaned, size-capped resume text.
//!
//! This is a collaborator of the scoring core: the segmenter only ever sees the `text`
//! produced here. Failures never panic; they surface as `success = false` plus warnings.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::clean::{cap_text, clean_text};

/// Below this many characters a PDF is most likely scanned images without a text layer.
const MIN_USEFUL_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),
}

/// Result of extracting one uploaded document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub success: bool,
    pub warnings: Vec<String>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileKind {
    Pdf,
    Docx,
    PlainText,
}

fn file_kind(filename: &str) -> FileKind {
    let name = filename.to_lowercase();
    if name.ends_with(".pdf") {
        FileKind::Pdf
    } else if name.ends_with(".docx") {
        FileKind::Docx
    } else {
        FileKind::PlainText
    }
}

/// Extracts text from PDF or plain-text uploads based on the file extension.
pub fn extract(filename: &str, bytes: &[u8], max_chars: usize) -> ExtractedText {
    let raw = match file_kind(filename) {
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string())),
        FileKind::Docx => Err(ExtractError::Unsupported(
            "DOCX upload is not supported; export the resume as PDF or plain text".to_string(),
        )),
        FileKind::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
    };

    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Extraction failed for '{filename}': {e}");
            return ExtractedText {
                text: String::new(),
                success: false,
                warnings: vec![e.to_string()],
                truncated: false,
            };
        }
    };

    let (text, truncated) = cap_text(clean_text(&raw), max_chars);
    let mut warnings = Vec::new();

    if truncated {
        warnings.push(format!(
            "Document exceeded {max_chars} characters and was truncated"
        ));
    }
    if text.chars().count() < MIN_USEFUL_CHARS {
        warnings.push(
            "Very little text was extracted; scanned PDFs may need OCR before upload".to_string(),
        );
    }

    debug!(
        "Extracted {} chars from '{filename}' (truncated: {truncated})",
        text.len()
    );

    ExtractedText {
        success: !text.is_empty(),
        text,
        warnings,
        truncated,
    }
}
