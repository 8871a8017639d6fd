//! Error types for the bill-extract library.
//!
//! Only failures that prevent obtaining *any* data reach callers as
//! [`BillExtractError`]: the document could not be fetched, decoded, or
//! rasterised, or no language-model provider is configured. Failures that
//! merely reduce data quality — a page the model could not read, a
//! deduplication pass that returned garbage — are absorbed inside the
//! extraction pipeline and degrade to safe defaults instead of erroring.
//!
//! That split keeps the request contract simple: a request either yields a
//! complete (possibly imperfect) extraction, or one fatal error.

use thiserror::Error;

/// All fatal errors returned by the bill-extract library.
///
/// Per-page extraction and deduplication failures are absorbed inside
/// [`crate::extract`] and never appear here.
#[derive(Debug, Error)]
pub enum BillExtractError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// HTTP GET on the document reference failed.
    #[error("Failed to fetch document '{url}': {reason}")]
    DocumentFetchFailed { url: String, reason: String },

    /// The fetch exceeded its timeout (60s for PDFs, 30s for images).
    #[error("Fetch timed out after {secs}s for '{url}'")]
    DocumentFetchTimeout { url: String, secs: u64 },

    /// The document body exceeded the configured size cap.
    #[error("Document '{url}' exceeds the {limit_bytes}-byte limit")]
    PayloadTooLarge { url: String, limit_bytes: u64 },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// pdfium could not open the fetched bytes as a PDF.
    #[error("Failed to process PDF: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium returned an error while rendering a specific page.
    #[error("Failed to process PDF: rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The fetched bytes could not be decoded as an image.
    #[error("Failed to process image: {detail}")]
    ImageDecodeFailed { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error for a single call.
    ///
    /// Surfaces from [`crate::model::VisionModel::complete`]; the extraction
    /// pipeline absorbs it per page rather than propagating it.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
