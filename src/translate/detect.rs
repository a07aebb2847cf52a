//! Source language detection.
//! Both detectors work on a bounded sample and fall back to `"auto"`, so a
//! failed guess only hands detection back to the translation endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{BackendQuery, TranslateBackend, DETECT_DATA_TYPES};
use super::{char_prefix, TranslateError, AUTO_LANGUAGE};

#[async_trait]
pub trait DetectLanguage: Send + Sync {
    /// Best-effort language code, or `"auto"` when unsure.
    async fn detect(&self, text: &str) -> String;
}

/// Asks the translation endpoint for its detected source language.
pub struct RemoteDetector {
    backend: Arc<dyn TranslateBackend>,
    sample_chars: usize,
}

impl RemoteDetector {
    pub fn new(backend: Arc<dyn TranslateBackend>, sample_chars: usize) -> Self {
        Self {
            backend,
            sample_chars,
        }
    }

    async fn try_detect(&self, text: &str) -> Result<String, TranslateError> {
        let sample = char_prefix(text, self.sample_chars);
        let body = self
            .backend
            .fetch(BackendQuery {
                text: sample,
                source_language: AUTO_LANGUAGE,
                target_language: "en",
                data_types: DETECT_DATA_TYPES,
            })
            .await
            .map_err(|e| TranslateError::Detection(e.to_string()))?;

        detected_language(&body)
            .map(str::to_string)
            .ok_or_else(|| TranslateError::Detection("no language code at [2]".into()))
    }
}

#[async_trait]
impl DetectLanguage for RemoteDetector {
    async fn detect(&self, text: &str) -> String {
        match self.try_detect(text).await {
            Ok(lang) => {
                debug!(lang = %lang, "source language detected");
                lang
            }
            Err(e) => {
                warn!(error = %e, "language detection failed, using auto");
                AUTO_LANGUAGE.to_string()
            }
        }
    }
}

/// Language code at index 2 of a detection body.
fn detected_language(body: &Value) -> Option<&str> {
    body.get(2).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Offline detection with whatlang. No network call.
pub struct LocalDetector {
    sample_chars: usize,
}

impl LocalDetector {
    pub fn new(sample_chars: usize) -> Self {
        Self { sample_chars }
    }
}

#[async_trait]
impl DetectLanguage for LocalDetector {
    async fn detect(&self, text: &str) -> String {
        let sample = char_prefix(text, self.sample_chars);
        match whatlang::detect(sample) {
            Some(info) if info.is_reliable() => match lang_to_code(info.lang()) {
                Some(code) => code.to_string(),
                None => AUTO_LANGUAGE.to_string(),
            },
            _ => {
                debug!("local detection unreliable, using auto");
                AUTO_LANGUAGE.to_string()
            }
        }
    }
}

/// Map a whatlang guess to the endpoint's language code.
fn lang_to_code(lang: whatlang::Lang) -> Option<&'static str> {
    use whatlang::Lang::*;
    let code = match lang {
        Eng => "en",
        Cmn => "zh-CN",
        Jpn => "ja",
        Kor => "ko",
        Fra => "fr",
        Deu => "de",
        Spa => "es",
        Rus => "ru",
        Por => "pt",
        Ita => "it",
        Ara => "ar",
        Hin => "hi",
        Tur => "tr",
        Vie => "vi",
        Tha => "th",
        Nld => "nl",
        Pol => "pl",
        Ukr => "uk",
        _ => return None,
    };
    Some(code)
}
