//! Configuration for the extraction pipeline.
//!
//! Every knob lives in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. One struct keeps the config trivial to share
//! across requests and to log when two runs disagree.

use crate::error::BillExtractError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for bill extraction.
///
/// # Example
/// ```rust
/// use bill_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o")
///     .temperature(0.1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gpt-4o". If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected from
    /// API-key environment variables.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for every model call. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// page; higher values introduce creativity that corrupts amounts.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 4096.
    ///
    /// Dense pharmacy pages can run past 2 000 output tokens; setting this
    /// too low truncates the JSON mid-array and the whole page degrades to
    /// an empty result.
    pub max_tokens: usize,

    /// Target rendered page width in pixels. Default: 2000.
    pub render_target_width: u32,

    /// Maximum rendered page height in pixels. Default: 2800.
    ///
    /// Caps pdfium's allocation for unusually tall pages while keeping the
    /// text large enough for the model to read line items reliably.
    pub render_max_height: u32,

    /// Fetch timeout for PDF documents in seconds. Default: 60.
    pub pdf_fetch_timeout_secs: u64,

    /// Fetch timeout for image documents in seconds. Default: 30.
    pub image_fetch_timeout_secs: u64,

    /// Maximum accepted PDF payload in bytes. Default: 100 MB.
    pub max_pdf_bytes: u64,

    /// Minimum flattened item count before the deduplication pass runs.
    /// Default: 5.
    ///
    /// At five items or fewer the reconciliation call costs more tokens than
    /// any duplicate it could remove.
    pub dedup_min_items: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            render_target_width: 2000,
            render_max_height: 2800,
            pdf_fetch_timeout_secs: 60,
            image_fetch_timeout_secs: 30,
            max_pdf_bytes: 100 * 1024 * 1024,
            dedup_min_items: 5,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("render_target_width", &self.render_target_width)
            .field("render_max_height", &self.render_max_height)
            .field("pdf_fetch_timeout_secs", &self.pdf_fetch_timeout_secs)
            .field("image_fetch_timeout_secs", &self.image_fetch_timeout_secs)
            .field("max_pdf_bytes", &self.max_pdf_bytes)
            .field("dedup_min_items", &self.dedup_min_items)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn render_target_width(mut self, px: u32) -> Self {
        self.config.render_target_width = px.max(100);
        self
    }

    pub fn render_max_height(mut self, px: u32) -> Self {
        self.config.render_max_height = px.max(100);
        self
    }

    pub fn pdf_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pdf_fetch_timeout_secs = secs;
        self
    }

    pub fn image_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_fetch_timeout_secs = secs;
        self
    }

    pub fn max_pdf_bytes(mut self, bytes: u64) -> Self {
        self.config.max_pdf_bytes = bytes;
        self
    }

    pub fn dedup_min_items(mut self, n: usize) -> Self {
        self.config.dedup_min_items = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, BillExtractError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(BillExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.pdf_fetch_timeout_secs == 0 || c.image_fetch_timeout_secs == 0 {
            return Err(BillExtractError::InvalidConfig(
                "Fetch timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = ExtractionConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.pdf_fetch_timeout_secs, 60);
        assert_eq!(c.image_fetch_timeout_secs, 30);
        assert_eq!(c.max_pdf_bytes, 100 * 1024 * 1024);
        assert_eq!(c.dedup_min_items, 5);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ExtractionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(ExtractionConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ExtractionConfig::builder()
            .image_fetch_timeout_secs(0)
            .build()
            .is_err());
    }
}
