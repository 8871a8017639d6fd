//! Image encoding: [`PageImage`] → base64 [`ImageData`] for the model call.
//!
//! Vision APIs accept images as base64 data-URIs embedded in the JSON
//! request body. `detail: "high"` instructs GPT-4-class models to use the
//! full image tile budget; without it the small print on dense bill pages —
//! exactly where the amounts live — is lost.

use crate::output::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode a normalised page as a base64 attachment ready for the model API.
pub fn encode_page(page: &PageImage) -> ImageData {
    let b64 = STANDARD.encode(&page.image_data);
    debug!(
        "Encoded page {} → {} bytes base64",
        page.page_number,
        b64.len()
    );
    ImageData::new(b64, page.media_type.as_str()).with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_small_page() {
        let page = PageImage {
            page_number: 1,
            image_data: vec![0x89, 0x50, 0x4E, 0x47],
            media_type: "image/png".to_string(),
        };
        let data = encode_page(&page);
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, page.image_data);
    }
}
