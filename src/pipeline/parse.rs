//! Tolerant recovery of structured items from free-form model output.
//!
//! Vision models are asked for pure JSON and regularly answer with prose
//! around it anyway. Recovery is an explicit three-tier fallback chain, in
//! order:
//!
//! 1. parse the substring from the first `{` through the last `}`;
//! 2. parse the whole response verbatim;
//! 3. give up and let the caller substitute its safe default.
//!
//! The chain is spelled out as plain control flow rather than nested error
//! handling so the recovery policy is visible at a glance.
//!
//! Item normalisation mirrors the same tolerance: a field that is absent,
//! the wrong type, or unparseable becomes its documented default — never an
//! error.

use crate::output::{BillItem, PageItems, DEFAULT_PAGE_TYPE};
use serde_json::Value;

/// Locate and parse the JSON object buried in a model response.
///
/// Returns `None` when no tier yields a JSON object; the caller decides the
/// degraded result (empty page, or skipping deduplication).
pub fn parse_embedded_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Some(value).filter(Value::is_object);
            }
        }
    }

    serde_json::from_str::<Value>(trimmed)
        .ok()
        .filter(Value::is_object)
}

/// Build the page result from a recovered (or absent) JSON object.
///
/// Absent, non-string, or empty `page_type` falls back to
/// [`DEFAULT_PAGE_TYPE`]; a missing or malformed `bill_items` array becomes
/// empty.
pub fn page_items_from_value(page_number: usize, parsed: Option<&Value>) -> PageItems {
    let page_type = parsed
        .and_then(|v| v.get("page_type"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PAGE_TYPE)
        .to_string();

    let bill_items = parsed
        .and_then(|v| v.get("bill_items"))
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_item).collect())
        .unwrap_or_default();

    PageItems {
        page_no: page_number.to_string(),
        page_type,
        bill_items,
    }
}

/// Normalise one candidate item into the fixed schema.
///
/// Defaults: amount 0; rate falls back to amount, then 0 (an explicit zero
/// rate also falls through — a genuinely free line item carries amount 0
/// anyway); quantity 1 (zero and unparseable both default, quantities are
/// strictly positive).
pub fn normalize_item(raw: &Value) -> BillItem {
    let item_amount = coerce_number(raw.get("item_amount")).unwrap_or(0.0);

    let item_rate = coerce_number(raw.get("item_rate"))
        .filter(|n| *n != 0.0)
        .or_else(|| Some(item_amount).filter(|n| *n != 0.0))
        .unwrap_or(0.0);

    let item_quantity = coerce_number(raw.get("item_quantity"))
        .filter(|n| *n != 0.0)
        .unwrap_or(1.0);

    BillItem {
        item_name: coerce_name(raw.get("item_name")),
        item_amount,
        item_rate,
        item_quantity,
    }
}

/// String coercion for item names: numbers render as text, anything else
/// unusable becomes the empty string.
fn coerce_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Numeric coercion accepting JSON numbers and numeric strings.
///
/// Non-finite results count as unparseable so a stray `"NaN"` from the model
/// cannot poison an amount.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recovers_object_surrounded_by_prose() {
        let text = "Sure! Here is the data:\n{\"page_type\": \"Pharmacy\", \"bill_items\": []}\nLet me know if you need more.";
        let value = parse_embedded_object(text).unwrap();
        assert_eq!(value["page_type"], "Pharmacy");
    }

    #[test]
    fn recovers_bare_object() {
        let value = parse_embedded_object("{\"bill_items\": []}").unwrap();
        assert!(value["bill_items"].is_array());
    }

    #[test]
    fn plain_prose_yields_none() {
        assert!(parse_embedded_object("I could not read this page.").is_none());
    }

    #[test]
    fn non_object_json_yields_none() {
        assert!(parse_embedded_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn mismatched_braces_fall_through_to_none() {
        assert!(parse_embedded_object("} nothing here {").is_none());
    }

    #[test]
    fn numeric_normalization_vector() {
        // amount "12.5", rate absent, quantity "abc"
        let item = normalize_item(&json!({
            "item_name": "Paracetamol",
            "item_amount": "12.5",
            "item_quantity": "abc"
        }));
        assert_eq!(item.item_amount, 12.5);
        assert_eq!(item.item_rate, 12.5);
        assert_eq!(item.item_quantity, 1.0);
    }

    #[test]
    fn zero_rate_falls_back_to_amount() {
        let item = normalize_item(&json!({
            "item_name": "CBC Test",
            "item_amount": 450.0,
            "item_rate": 0,
            "item_quantity": 1
        }));
        assert_eq!(item.item_rate, 450.0);
    }

    #[test]
    fn zero_quantity_defaults_to_one() {
        let item = normalize_item(&json!({"item_quantity": 0, "item_amount": 10}));
        assert_eq!(item.item_quantity, 1.0);
    }

    #[test]
    fn missing_everything_yields_pure_defaults() {
        let item = normalize_item(&json!({}));
        assert_eq!(item.item_name, "");
        assert_eq!(item.item_amount, 0.0);
        assert_eq!(item.item_rate, 0.0);
        assert_eq!(item.item_quantity, 1.0);
    }

    #[test]
    fn numeric_name_renders_as_text() {
        let item = normalize_item(&json!({"item_name": 42}));
        assert_eq!(item.item_name, "42");
    }

    #[test]
    fn nan_string_counts_as_unparseable() {
        let item = normalize_item(&json!({"item_amount": "NaN"}));
        assert_eq!(item.item_amount, 0.0);
    }

    #[test]
    fn page_from_missing_value_is_empty_default() {
        let page = page_items_from_value(2, None);
        assert_eq!(page, PageItems::empty(2));
    }

    #[test]
    fn page_type_kept_verbatim() {
        let value = json!({"page_type": "Final Bill", "bill_items": []});
        let page = page_items_from_value(1, Some(&value));
        assert_eq!(page.page_type, "Final Bill");
    }

    #[test]
    fn malformed_bill_items_degrades_to_empty() {
        let value = json!({"page_type": "Bill Detail", "bill_items": "oops"});
        let page = page_items_from_value(1, Some(&value));
        assert!(page.bill_items.is_empty());
    }
}
