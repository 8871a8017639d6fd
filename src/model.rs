//! The vision-model seam: one trait between the pipeline and the provider.
//!
//! The extraction pipeline treats the language model as an opaque
//! capability: given a system instruction, a user instruction, and at most
//! one image, it returns free-form text plus a token-usage record. Putting a
//! trait at exactly that boundary keeps provider plumbing out of the
//! extraction logic and lets tests script model replies instead of making
//! live API calls.

use crate::config::ExtractionConfig;
use crate::error::BillExtractError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One model invocation: instructions plus an optional page image.
#[derive(Clone)]
pub struct ModelPrompt {
    /// System instruction; `None` for the deduplication pass.
    pub system: Option<String>,
    /// User instruction.
    pub user: String,
    /// At most one embedded page image, already base64-encoded.
    pub image: Option<ImageData>,
}

impl fmt::Debug for ModelPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPrompt")
            .field("system", &self.system)
            .field("user", &self.user)
            .field("image", &self.image.as_ref().map(|_| "<ImageData>"))
            .finish()
    }
}

/// Free-form model reply plus its token accounting.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A vision-capable language model.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Run one completion. Errors here are absorbed by the caller — a failed
    /// call degrades the page (or the dedup pass), never the whole request.
    async fn complete(&self, prompt: ModelPrompt) -> Result<ModelReply, BillExtractError>;
}

/// Production [`VisionModel`] backed by an `edgequake-llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl VisionModel for ProviderModel {
    async fn complete(&self, prompt: ModelPrompt) -> Result<ModelReply, BillExtractError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage::system(system.as_str()));
        }
        match prompt.image {
            Some(image) => {
                messages.push(ChatMessage::user_with_images(prompt.user.as_str(), vec![image]))
            }
            None => messages.push(ChatMessage::user(prompt.user.as_str())),
        }

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| BillExtractError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "Model call: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(ModelReply {
            content: response.content,
            input_tokens: response.prompt_tokens as u32,
            output_tokens: response.completion_tokens as u32,
        })
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is; useful in
///    tests or when the caller wraps the provider in middleware.
/// 2. **Named provider + model** (`config.provider_name`) — instantiated via
///    [`ProviderFactory::create_llm_provider`], which reads the matching API
///    key (`OPENAI_API_KEY`, etc.) from the environment.
/// 3. **OPENAI_API_KEY preference** — users holding several provider keys
///    default to OpenAI unless they named another provider.
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans known API-key variables and picks the first available provider.
pub fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<Arc<dyn LLMProvider>, BillExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or("gpt-4o");

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| BillExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, BillExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        BillExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
