//! Translation orchestration: detect → cache → (chunk + fan-out | direct) → cache.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::backend::TranslateBackend;
use super::cache::TranslationCache;
use super::chunk::chunk_text;
use super::client::ChunkTranslator;
use super::detect::{DetectLanguage, LocalDetector, RemoteDetector};
use super::{TranslateError, TranslateRequest, TranslationResult, AUTO_LANGUAGE};
use crate::config::{DetectorKind, TranslatorConfig};
use crate::metrics::{PipelineMetrics, Stage};

pub struct TranslationService {
    client: ChunkTranslator,
    detector: Box<dyn DetectLanguage>,
    cache: Arc<TranslationCache>,
    metrics: Arc<PipelineMetrics>,
    max_text_length: usize,
    min_detect_length: usize,
}

impl TranslationService {
    pub fn new(
        config: &TranslatorConfig,
        backend: Arc<dyn TranslateBackend>,
        cache: Arc<TranslationCache>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let detector: Box<dyn DetectLanguage> = match config.detector {
            DetectorKind::Remote => Box::new(RemoteDetector::new(
                Arc::clone(&backend),
                config.detect_sample_chars,
            )),
            DetectorKind::Local => Box::new(LocalDetector::new(config.detect_sample_chars)),
        };

        Self {
            client: ChunkTranslator::new(backend),
            detector,
            cache,
            metrics,
            max_text_length: config.max_text_length.max(1),
            min_detect_length: config.min_detect_length,
        }
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Translate `request.text`.
    ///
    /// Blank text short-circuits to an empty result. Only successful results
    /// are cached; failures are returned and never stored.
    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslationResult, TranslateError> {
        let text = request.text.as_str();
        if text.trim().is_empty() {
            return Ok(TranslationResult::empty());
        }

        let timer = self.metrics.time(Stage::Translate);
        let char_len = text.chars().count();
        let target = request.target_language.as_str();

        let mut source = request.source_language.clone();
        if source == AUTO_LANGUAGE && char_len > self.min_detect_length {
            let detect_timer = self.metrics.time(Stage::Detect);
            source = self.detector.detect(text).await;
            detect_timer.finish();
        }

        let key = TranslationCache::compute_key(text, &source, target);
        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            timer.finish();
            debug!(sl = %source, tl = target, "translation cache hit");
            return Ok(hit);
        }
        self.metrics.record_cache_miss();

        let outcome = if char_len > self.max_text_length {
            self.translate_chunked(text, target, &source).await
        } else {
            self.translate_direct(text, target, &source).await
        };

        match outcome {
            Ok(result) => {
                self.cache.put(key, result.clone());
                let elapsed = timer.finish();
                info!(
                    chars = char_len,
                    sl = %source,
                    tl = target,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "translation complete"
                );
                Ok(result)
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(error = %e, chars = char_len, sl = %source, tl = target, "translation failed");
                Err(e)
            }
        }
    }

    /// Like [`Self::translate`], but failures come back in the legacy
    /// error-string shape for display layers.
    pub async fn translate_for_display(&self, request: &TranslateRequest) -> TranslationResult {
        match self.translate(request).await {
            Ok(result) => result,
            Err(e) => TranslationResult::from_error(&e),
        }
    }

    async fn translate_direct(
        &self,
        text: &str,
        target: &str,
        source: &str,
    ) -> Result<TranslationResult, TranslateError> {
        let timer = self.metrics.time(Stage::ChunkRequest);
        let result = self.client.translate_chunk(text, target, source).await;
        timer.finish();
        result
    }

    /// Split, translate every chunk concurrently, and join in chunk order.
    /// Alternatives come from the first chunk only.
    async fn translate_chunked(
        &self,
        text: &str,
        target: &str,
        source: &str,
    ) -> Result<TranslationResult, TranslateError> {
        let chunks = chunk_text(text, self.max_text_length);
        info!(chunks = chunks.len(), "translating long text in chunks");
        self.metrics.record_fan_out(chunks.len());

        let outcomes = join_all(
            chunks
                .iter()
                .map(|chunk| self.translate_direct(chunk, target, source)),
        )
        .await;

        let mut parts = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(part) => parts.push(part),
                Err(e) => {
                    warn!(chunk = index, error = %e, "chunk translation failed");
                    return Err(TranslateError::ChunkAggregate(Box::new(e)));
                }
            }
        }

        let main_translation = parts
            .iter()
            .map(|p| p.main_translation.as_str())
            .collect::<String>();
        let translations_by_type = parts
            .into_iter()
            .next()
            .map(|first| first.translations_by_type)
            .unwrap_or_default();

        Ok(TranslationResult {
            main_translation,
            translations_by_type,
        })
    }
}
