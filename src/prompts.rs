//! Prompts for bill line-item extraction and cross-page deduplication.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing extraction behaviour (a new page
//!    type, a tweak to the duplicate rules) is an edit in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    spinning up a real model, so a silently dropped rule is caught.

/// System prompt for extracting line items from one bill page image.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert bill/invoice data extractor. Your task is to extract all line items from the bill image provided.

IMPORTANT INSTRUCTIONS:
1. Extract EVERY line item visible in the bill - do not miss any entries
2. Do NOT double count items - each item should appear only once
3. Identify the page type: "Bill Detail" (itemized charges), "Final Bill" (summary page), or "Pharmacy" (medicine bills)
4. For each item, extract:
   - item_name: The exact name as it appears in the bill
   - item_amount: The net/final amount for that item (after any discounts)
   - item_rate: The unit rate/price per item (if visible, otherwise use item_amount)
   - item_quantity: The quantity (if visible, otherwise use 1)

5. Handle different bill formats:
   - Hospital bills: Look for room charges, doctor fees, procedures, tests, medicines
   - Pharmacy bills: Look for medicine names, quantities, prices
   - Lab bills: Look for test names and charges

6. IGNORE summary totals, subtotals, tax lines, and grand totals - only extract actual line items
7. If item_rate or item_quantity is not visible, derive them logically (amount = rate × quantity)

Return the data in this exact JSON format:
{
  "page_type": "Bill Detail | Final Bill | Pharmacy",
  "bill_items": [
    {
      "item_name": "string",
      "item_amount": float,
      "item_rate": float,
      "item_quantity": float
    }
  ]
}

Return ONLY valid JSON, no additional text."#;

/// Per-page user instruction accompanying the page image.
pub fn page_user_prompt(page_number: usize) -> String {
    format!(
        "Extract all line items from this bill image (Page {page_number}). \
         Return ONLY the JSON object with page_type and bill_items array."
    )
}

/// Prompt for the cross-page reconciliation pass.
///
/// `items_json` is the pretty-printed flattened item list, each entry tagged
/// with its source `page_no` and `page_type`. The model must answer with the
/// items to KEEP — a keep-list is unambiguous where a remove-list is not when
/// the same item repeats three times.
pub fn dedup_prompt(items_json: &str) -> String {
    format!(
        r#"Analyze these bill items from multiple pages and identify any DUPLICATE entries that should be removed to avoid double counting.

Items:
{items_json}

Rules:
1. Items with the same or very similar names AND same amounts are likely duplicates
2. Summary pages (Final Bill) often repeat items from detail pages - mark those for removal
3. Keep items from detail pages, remove duplicates from summary pages
4. Pharmacy items might have same medicine name but different quantities - these are NOT duplicates

Return a JSON array of objects to KEEP (remove duplicates), maintaining the original structure:
{{
  "items_to_keep": [
    {{
      "page_no": "string",
      "page_type": "string",
      "item_name": "string",
      "item_amount": float,
      "item_rate": float,
      "item_quantity": float
    }}
  ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_covers_page_types_and_fields() {
        for needle in [
            "Bill Detail",
            "Final Bill",
            "Pharmacy",
            "item_name",
            "item_amount",
            "item_rate",
            "item_quantity",
        ] {
            assert!(
                EXTRACTION_SYSTEM_PROMPT.contains(needle),
                "missing: {needle}"
            );
        }
    }

    #[test]
    fn page_prompt_names_the_page() {
        let prompt = page_user_prompt(3);
        assert!(prompt.contains("Page 3"));
    }

    #[test]
    fn dedup_prompt_embeds_items_and_keep_list_rules() {
        let prompt = dedup_prompt("[{\"item_name\": \"X-Ray\"}]");
        assert!(prompt.contains("X-Ray"));
        assert!(prompt.contains("items_to_keep"));
        // Quantity difference must be decisive evidence of distinctness.
        assert!(prompt.contains("NOT duplicates"));
        // Summary-page copies are removed, detail-page copies kept.
        assert!(prompt.contains("remove duplicates from summary pages"));
    }
}
