//! Wire-format types produced by the extraction pipeline.
//!
//! Field names here are the HTTP response contract — they serialise exactly
//! as consumers see them (`page_no`, `bill_items`, `pagewise_line_items`, …),
//! so renaming a field is an API break even though these are plain structs.

use serde::{Deserialize, Serialize};

/// Page classification the model falls back to when it reports nothing
/// usable. The other classifications the prompt teaches are `"Final Bill"`
/// and `"Pharmacy"`, but the field stays a free string: the pipeline keeps
/// whatever the model answered rather than rewriting it into an enum.
pub const DEFAULT_PAGE_TYPE: &str = "Bill Detail";

/// A single rasterised page of the source document.
///
/// Produced once by the fetch/rasterise stage, consumed once by the page
/// extractor. `image_data` is always PNG after normalisation.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based physical page number; sequence order equals page order.
    pub page_number: usize,
    /// Encoded image bytes.
    pub image_data: Vec<u8>,
    /// Media type of `image_data`, e.g. `"image/png"`.
    pub media_type: String,
}

/// One billed entry on a page.
///
/// Best-effort invariant: `item_amount ≈ item_rate × item_quantity`. The
/// model is instructed to derive missing fields accordingly, but nothing
/// enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    /// The item name exactly as it appears on the bill.
    pub item_name: String,
    /// Net amount for the item, after any discount.
    pub item_amount: f64,
    /// Unit rate; falls back to `item_amount` when not separately visible.
    pub item_rate: f64,
    /// Quantity; defaults to 1 when not visible.
    pub item_quantity: f64,
}

/// Extraction result for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageItems {
    /// Stringified 1-based page number.
    pub page_no: String,
    /// Model-reported classification, defaulting to [`DEFAULT_PAGE_TYPE`].
    pub page_type: String,
    /// Line items in page order.
    pub bill_items: Vec<BillItem>,
}

impl PageItems {
    /// A degenerate-but-valid result for a page that yielded nothing —
    /// unparseable model output or a failed call.
    pub fn empty(page_number: usize) -> Self {
        Self {
            page_no: page_number.to_string(),
            page_type: DEFAULT_PAGE_TYPE.to_string(),
            bill_items: Vec::new(),
        }
    }
}

/// Payload half of the final response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionData {
    /// Per-page item lists, in input page order.
    pub pagewise_line_items: Vec<PageItems>,
    /// Sum of `bill_items` lengths across every page.
    pub total_item_count: usize,
}

/// Terminal artifact of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Token consumption across every model call made for this request.
    pub token_usage: crate::usage::TokenUsage,
    /// The extracted, deduplicated line items.
    pub data: ExtractionData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_defaults() {
        let p = PageItems::empty(4);
        assert_eq!(p.page_no, "4");
        assert_eq!(p.page_type, DEFAULT_PAGE_TYPE);
        assert!(p.bill_items.is_empty());
    }

    #[test]
    fn bill_item_wire_field_names() {
        let item = BillItem {
            item_name: "Room Charges".into(),
            item_amount: 1200.0,
            item_rate: 600.0,
            item_quantity: 2.0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["item_name"], "Room Charges");
        assert_eq!(json["item_rate"], 600.0);
    }

    #[test]
    fn extraction_result_wire_shape() {
        let result = ExtractionResult {
            token_usage: crate::usage::TokenUsage::default(),
            data: ExtractionData {
                pagewise_line_items: vec![PageItems::empty(1)],
                total_item_count: 0,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["data"]["pagewise_line_items"].is_array());
        assert_eq!(json["data"]["total_item_count"], 0);
        assert_eq!(json["token_usage"]["total_tokens"], 0);
    }
}
