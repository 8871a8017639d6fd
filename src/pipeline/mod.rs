//! Pipeline stages turning a document reference into extraction input.
//!
//! Each submodule implements exactly one transformation step, keeping every
//! stage independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ render ──▶ encode ──▶ parse
//! (URL)    (pdfium /   (base64)  (model output →
//!           re-encode)            normalised items)
//! ```
//!
//! 1. [`fetch`]  — classify the reference as PDF or image and download it
//! 2. [`render`] — rasterise PDF pages (in `spawn_blocking`, pdfium is not
//!    async-safe) or re-encode a fetched image; both normalise to PNG
//! 3. [`encode`] — base64-wrap each page for the multimodal request body
//! 4. [`parse`]  — tolerant recovery of the JSON object buried in model
//!    output, plus item normalisation

pub mod encode;
pub mod fetch;
pub mod parse;
pub mod render;
