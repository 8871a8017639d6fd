//! # bill-extract
//!
//! Extract structured line items from bill/invoice documents (hospital,
//! pharmacy, lab) using Vision Language Models.
//!
//! Rule-based invoice parsers break on every new hospital's bill layout.
//! Instead this crate rasterises each page into a PNG and lets a VLM read it
//! as a billing clerk would, returning every line item as structured data —
//! then runs a second reconciliation pass so a summary page restating the
//! detail pages does not double-count anything.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document URL
//!  │
//!  ├─ 1. Fetch    classify as PDF/image by reference, download with timeouts
//!  ├─ 2. Render   rasterise PDF pages via pdfium (CPU-bound, spawn_blocking)
//!  │              or re-encode the fetched image; everything becomes PNG
//!  ├─ 3. Extract  one sequential VLM call per page → normalised line items
//!  ├─ 4. Dedup    one reconciliation call filters summary-page repeats
//!  └─ 5. Output   pagewise items + total count + token usage
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bill_extract::{extract_bill, resolve_provider, ExtractionConfig, ProviderModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let model = ProviderModel::new(resolve_provider(&config)?, &config);
//!     let result = extract_bill(&model, "https://example.com/bill.pdf", &config).await?;
//!     println!("{} items", result.data.total_item_count);
//!     eprintln!(
//!         "tokens: {} in / {} out",
//!         result.token_usage.input_tokens, result.token_usage.output_tokens
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the HTTP service (axum + tower-http) and the `bill-extract-server` binary |
//!
//! Disable `server` when using only the extraction library:
//! ```toml
//! bill-extract = { version = "0.1", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! A page the model cannot read degrades to an empty page; a garbled
//! deduplication reply degrades to the non-deduplicated items. Only fetch
//! and rasterisation failures — where no data can be obtained at all —
//! surface as errors.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod usage;

#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::BillExtractError;
pub use extract::{deduplicate_items, extract_bill, extract_line_items, extract_page_items};
pub use model::{resolve_provider, ModelPrompt, ModelReply, ProviderModel, VisionModel};
pub use output::{BillItem, ExtractionData, ExtractionResult, PageImage, PageItems};
pub use usage::{TokenTracker, TokenUsage};

#[cfg(feature = "server")]
pub use server::{router, AppState};
