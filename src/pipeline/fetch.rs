//! Document fetch: classify a reference as PDF or image and download it.
//!
//! Classification is a substring heuristic, not an extension check: any
//! reference whose lowercased form contains "pdf" takes the PDF path. Signed
//! URLs routinely bury the format in a query parameter or path segment
//! rather than an extension, and a PDF routed down the image path fails
//! outright while the reverse merely costs one wasted pdfium open.

use crate::config::ExtractionConfig;
use crate::error::BillExtractError;
use std::time::Duration;
use tracing::{debug, info};

/// How the reference will be rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Multi-page: every page becomes one image.
    Pdf,
    /// Single page: the fetched bytes are one image.
    Image,
}

/// The fetched document, ready for rasterisation.
#[derive(Debug)]
pub struct FetchedDocument {
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// Classify a document reference.
pub fn classify_reference(reference: &str) -> DocumentKind {
    if reference.to_lowercase().contains("pdf") {
        DocumentKind::Pdf
    } else {
        DocumentKind::Image
    }
}

/// Download the document, enforcing the per-kind timeout and, for PDFs, the
/// payload size cap.
pub async fn fetch_document(
    url: &str,
    config: &ExtractionConfig,
) -> Result<FetchedDocument, BillExtractError> {
    let kind = classify_reference(url);
    let timeout_secs = match kind {
        DocumentKind::Pdf => config.pdf_fetch_timeout_secs,
        DocumentKind::Image => config.image_fetch_timeout_secs,
    };
    info!("Fetching {:?} document: {}", kind, url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BillExtractError::DocumentFetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            BillExtractError::DocumentFetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillExtractError::DocumentFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(BillExtractError::DocumentFetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    // Reject oversized PDFs from the declared length before buffering the
    // body; servers that omit Content-Length are caught by the byte count
    // below.
    if kind == DocumentKind::Pdf {
        if let Some(declared) = response.content_length() {
            if declared > config.max_pdf_bytes {
                return Err(BillExtractError::PayloadTooLarge {
                    url: url.to_string(),
                    limit_bytes: config.max_pdf_bytes,
                });
            }
        }
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            BillExtractError::DocumentFetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillExtractError::DocumentFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if kind == DocumentKind::Pdf && bytes.len() as u64 > config.max_pdf_bytes {
        return Err(BillExtractError::PayloadTooLarge {
            url: url.to_string(),
            limit_bytes: config.max_pdf_bytes,
        });
    }

    debug!("Fetched {} bytes", bytes.len());

    Ok(FetchedDocument {
        kind,
        bytes: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_is_pdf() {
        assert_eq!(
            classify_reference("https://example.com/bill.pdf"),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn pdf_substring_anywhere_is_pdf() {
        // Not an extension check: "pdf" in a path segment or query counts.
        assert_eq!(
            classify_reference("https://example.com/pdfs/scan.jpg"),
            DocumentKind::Pdf
        );
        assert_eq!(
            classify_reference("https://example.com/doc?format=PDF"),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            classify_reference("https://example.com/BILL.PDF"),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn everything_else_is_an_image() {
        assert_eq!(
            classify_reference("https://example.com/bill.jpg"),
            DocumentKind::Image
        );
        assert_eq!(
            classify_reference("https://example.com/scan.png?sig=abc"),
            DocumentKind::Image
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure() {
        let config = ExtractionConfig::default();
        // Port 9 (discard) is closed on loopback; fails fast, no network.
        let err = fetch_document("http://127.0.0.1:9/bill.jpg", &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillExtractError::DocumentFetchFailed { .. }
                | BillExtractError::DocumentFetchTimeout { .. }
        ));
    }
}
