//! Passage workflows: raw text, Afrikaans translation, and commentary.
//!
//! [`PassageService`] ties the extractor to the completion provider and the
//! translation cache. It holds all process-scoped state explicitly, so the
//! server and tests construct it with whatever store and provider they need.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::TtlCache;
use crate::completion::{CompletionProvider, CompletionRequest};
use crate::config::CompletionConfig;
use crate::extract::{extract_verses, passage_ref, range_key, ExtractError, PassageRange};
use crate::store::VerseStore;

const TRANSLATOR_SYSTEM: &str = "You are a precise translator.";
const COMMENTATOR_SYSTEM: &str =
    "You are Preach Point AI, an expert Bible commentary assistant.";
const COMMENTARY_TEMPERATURE: f32 = 0.7;
const COMMENTARY_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum PassageError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("completion failed: {0}")]
    Completion(#[source] anyhow::Error),
}

/// Commentary options chosen in the UI.
#[derive(Debug, Clone, Default)]
pub struct CommentaryOptions {
    pub tone: String,
    pub level: String,
    /// `"af"` selects Afrikaans; anything else is English.
    pub lang: String,
}

impl CommentaryOptions {
    pub fn language_label(&self) -> &'static str {
        if self.lang == "af" {
            "Afrikaans"
        } else {
            "English"
        }
    }
}

pub struct PassageService {
    store: Arc<VerseStore>,
    provider: Arc<dyn CompletionProvider>,
    cache: TtlCache,
    translate_model: String,
    commentary_model: String,
}

impl PassageService {
    pub fn new(
        store: Arc<VerseStore>,
        provider: Arc<dyn CompletionProvider>,
        completion: &CompletionConfig,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            cache: TtlCache::new(cache_ttl),
            translate_model: completion.translate_model.clone(),
            commentary_model: completion.commentary_model.clone(),
        }
    }

    pub fn store(&self) -> &VerseStore {
        &self.store
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// The extracted passage as newline-separated verse lines.
    pub fn text(&self, book: &str, range: &PassageRange) -> Result<String, ExtractError> {
        Ok(extract_verses(&self.store, book, range)?.join("\n"))
    }

    /// Translates the passage into Afrikaans, serving repeats from the cache.
    pub async fn translate(&self, book: &str, range: &PassageRange) -> Result<String, PassageError> {
        let key = range_key(book, range);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "translation cache hit");
            return Ok(hit);
        }

        let snippet = self.text(book, range)?;
        let request = CompletionRequest {
            model: self.translate_model.clone(),
            system: TRANSLATOR_SYSTEM.to_string(),
            prompt: translation_prompt(&snippet),
            temperature: 0.0,
            max_tokens: None,
        };

        let translation = self
            .provider
            .complete(&request)
            .await
            .map_err(PassageError::Completion)?;

        tracing::info!(%key, provider = self.provider.name(), "translated passage");
        self.cache.insert(key, translation.clone());
        Ok(translation)
    }

    /// Generates commentary on the passage. Never cached.
    pub async fn commentary(
        &self,
        book: &str,
        range: &PassageRange,
        options: &CommentaryOptions,
    ) -> Result<String, PassageError> {
        let scripture = self.text(book, range)?;
        let request = CompletionRequest {
            model: self.commentary_model.clone(),
            system: COMMENTATOR_SYSTEM.to_string(),
            prompt: commentary_prompt(&passage_ref(book, range), &scripture, options),
            temperature: COMMENTARY_TEMPERATURE,
            max_tokens: Some(COMMENTARY_MAX_TOKENS),
        };

        let commentary = self
            .provider
            .complete(&request)
            .await
            .map_err(PassageError::Completion)?;

        tracing::info!(
            passage = %passage_ref(book, range),
            lang = options.language_label(),
            "generated commentary"
        );
        Ok(commentary)
    }
}

fn translation_prompt(snippet: &str) -> String {
    format!(
        "Translate these Bible verses into Afrikaans, preserving verse numbers:\n\n{}",
        snippet
    )
}

fn commentary_prompt(reference: &str, scripture: &str, options: &CommentaryOptions) -> String {
    format!(
        "Here is the passage ({}):\n{}\n\nNow write a {} commentary at the \"{}\" level, using a \"{}\" tone.",
        reference,
        scripture,
        options.language_label(),
        options.level,
        options.tone
    )
}
