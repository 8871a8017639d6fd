//! Extraction core: per-page model calls, cross-page deduplication, and the
//! orchestrator assembling the final result.
//!
//! ## Failure policy
//!
//! Failures that reduce data quality are absorbed here: a page the model
//! could not read degrades to an empty page, a garbled deduplication reply
//! degrades to the non-deduplicated input. Only the fetch/rasterise stage —
//! where failure means no data at all — returns `Err` (see
//! [`extract_bill`]).
//!
//! ## Why sequential page calls?
//!
//! One model call at a time per request bounds the concurrent load this
//! service puts on the provider, avoids rate-limit bursts on large bills,
//! and keeps `pagewise_line_items` in input page order without sorting.
//! Requests themselves are still served concurrently — each gets its own
//! tracker and its own sequential chain.

use crate::config::ExtractionConfig;
use crate::error::BillExtractError;
use crate::model::{ModelPrompt, VisionModel};
use crate::output::{BillItem, ExtractionData, ExtractionResult, PageImage, PageItems};
use crate::pipeline::{encode, fetch, parse, render};
use crate::prompts::{dedup_prompt, page_user_prompt, EXTRACTION_SYSTEM_PROMPT};
use crate::usage::TokenTracker;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// One item flattened out of its page for the reconciliation prompt, tagged
/// with its source page.
#[derive(Debug, Serialize)]
struct FlatItem<'a> {
    page_no: &'a str,
    page_type: &'a str,
    item_name: &'a str,
    item_amount: f64,
    item_rate: f64,
    item_quantity: f64,
}

impl<'a> FlatItem<'a> {
    fn new(page: &'a PageItems, item: &'a BillItem) -> Self {
        Self {
            page_no: &page.page_no,
            page_type: &page.page_type,
            item_name: &item.item_name,
            item_amount: item.item_amount,
            item_rate: item.item_rate,
            item_quantity: item.item_quantity,
        }
    }
}

/// Extract the line items of a single page.
///
/// Never fails: a model error or an unparseable reply degrades to an empty
/// [`PageItems`] for this page only. Token usage is recorded for every reply
/// the model produced, whether or not it parsed.
pub async fn extract_page_items(
    model: &dyn VisionModel,
    page: &PageImage,
    tracker: &mut TokenTracker,
) -> PageItems {
    let prompt = ModelPrompt {
        system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
        user: page_user_prompt(page.page_number),
        image: Some(encode::encode_page(page)),
    };

    match model.complete(prompt).await {
        Ok(reply) => {
            tracker.add(reply.input_tokens, reply.output_tokens);

            let parsed = parse::parse_embedded_object(&reply.content);
            if parsed.is_none() {
                warn!(
                    "Failed to parse model response for page {}: {}",
                    page.page_number, reply.content
                );
            }
            parse::page_items_from_value(page.page_number, parsed.as_ref())
        }
        Err(e) => {
            warn!(
                "Error extracting items from page {}: {}",
                page.page_number, e
            );
            PageItems::empty(page.page_number)
        }
    }
}

/// Reconcile items repeated across pages (e.g. a summary page restating the
/// detail pages) down to a single copy.
///
/// Short-circuits — returning the input unchanged — when there is at most
/// one page or at most [`ExtractionConfig::dedup_min_items`] items in total.
/// Any failure past that point (model error, unparseable reply) also returns
/// the input unchanged: deduplication is a best-effort enhancement, never a
/// required step.
pub async fn deduplicate_items(
    model: &dyn VisionModel,
    pages: Vec<PageItems>,
    tracker: &mut TokenTracker,
    config: &ExtractionConfig,
) -> Vec<PageItems> {
    if pages.len() <= 1 {
        return pages;
    }

    let flattened: Vec<FlatItem<'_>> = pages
        .iter()
        .flat_map(|page| page.bill_items.iter().map(move |item| FlatItem::new(page, item)))
        .collect();

    if flattened.len() <= config.dedup_min_items {
        return pages;
    }

    let items_json = match serde_json::to_string_pretty(&flattened) {
        Ok(json) => json,
        Err(e) => {
            warn!("Error in deduplication: {}", e);
            return pages;
        }
    };

    let prompt = ModelPrompt {
        system: None,
        user: dedup_prompt(&items_json),
        image: None,
    };

    let reply = match model.complete(prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Error in deduplication: {}", e);
            return pages;
        }
    };
    tracker.add(reply.input_tokens, reply.output_tokens);

    let Some(parsed) = parse::parse_embedded_object(&reply.content) else {
        warn!("No JSON object in deduplication response, keeping all items");
        return pages;
    };

    // A parsed reply without items_to_keep keeps nothing: the model
    // answered, its answer is authoritative.
    let kept: Vec<Value> = parsed
        .get("items_to_keep")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    pages
        .iter()
        .map(|page| PageItems {
            page_no: page.page_no.clone(),
            page_type: page.page_type.clone(),
            bill_items: kept
                .iter()
                // String equality only: a kept item whose page_no came back
                // as a JSON number matches no page and is dropped.
                .filter(|item| {
                    item.get("page_no").and_then(Value::as_str) == Some(page.page_no.as_str())
                })
                .map(parse::normalize_item)
                .collect(),
        })
        .collect()
}

/// Run the full extraction over ordered page images.
///
/// Pages are processed strictly sequentially in input order, then
/// deduplicated once. All inner failures are already absorbed, so this
/// cannot fail with a recoverable error.
pub async fn extract_line_items(
    model: &dyn VisionModel,
    pages: &[PageImage],
    config: &ExtractionConfig,
) -> ExtractionResult {
    let mut tracker = TokenTracker::new();

    let mut pagewise = Vec::with_capacity(pages.len());
    for page in pages {
        pagewise.push(extract_page_items(model, page, &mut tracker).await);
    }

    let pagewise = deduplicate_items(model, pagewise, &mut tracker, config).await;

    let total_item_count = pagewise.iter().map(|p| p.bill_items.len()).sum();

    ExtractionResult {
        token_usage: tracker.usage(),
        data: ExtractionData {
            pagewise_line_items: pagewise,
            total_item_count,
        },
    }
}

/// Fetch, rasterise, and extract a bill document in one call.
///
/// This is the primary entry point for the library and the HTTP handler.
///
/// # Errors
/// Returns `Err` only when no data can be obtained at all: the document
/// could not be fetched, decoded, or rasterised.
pub async fn extract_bill(
    model: &dyn VisionModel,
    reference: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, BillExtractError> {
    let document = fetch::fetch_document(reference, config).await?;
    let pages = render::paginate(document, config).await?;
    info!("Document rasterised into {} pages", pages.len());

    Ok(extract_line_items(model, &pages, config).await)
}
