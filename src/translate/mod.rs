//! Translation pipeline: language detection, chunking, FIFO caching and the
//! chunk client that talks to the translation endpoint.

pub mod backend;
pub mod cache;
pub mod chunk;
pub mod client;
pub mod detect;
pub mod mock;
pub mod service;


use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use backend::{BackendQuery, DataType, GoogleBackend, TranslateBackend};
pub use cache::TranslationCache;
pub use chunk::chunk_text;
pub use client::{parse_response, ChunkTranslator};
pub use detect::{DetectLanguage, LocalDetector, RemoteDetector};
pub use service::TranslationService;

/// Maximum characters sent in a single translation request.
pub const MAX_TEXT_LENGTH: usize = 4000;
/// Characters of input used as the language detection sample.
pub const DETECT_LANGUAGE_LIMIT: usize = 100;
/// Translation cache capacity.
pub const MAX_CACHE_SIZE: usize = 50;
/// Texts at or below this many characters skip detection.
pub const MIN_DETECT_LENGTH: usize = 20;
/// Characters of input that take part in the cache key.
pub const CACHE_KEY_PREFIX_CHARS: usize = 50;
/// Alternatives kept per part-of-speech label.
pub const MAX_ALTERNATIVES_PER_TYPE: usize = 5;

/// Source language sentinel: let the backend decide.
pub const AUTO_LANGUAGE: &str = "auto";
pub const DEFAULT_TARGET_LANGUAGE: &str = "vi";

/// Translation request as received from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    pub source_language: String,
}

impl TranslateRequest {
    /// Request with the default target (`vi`) and source (`auto`).
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            source_language: AUTO_LANGUAGE.to_string(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_language = target.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_language = source.into();
        self
    }
}

/// Primary translation plus alternatives grouped by part of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub main_translation: String,
    pub translations_by_type: IndexMap<String, Vec<String>>,
}

impl TranslationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Legacy error-shaped result: the failure text in `main_translation`
    /// and no alternatives. Only for display layers; never cached.
    pub fn from_error(err: &TranslateError) -> Self {
        Self {
            main_translation: err.display_message(),
            translations_by_type: IndexMap::new(),
        }
    }
}

/// Prefix shown to users for a failed short-text translation.
pub const ERROR_PREFIX: &str = "Lỗi dịch thuật: ";
/// Prefix shown to users for a failed multi-chunk translation.
pub const CHUNKED_ERROR_PREFIX: &str = "Lỗi dịch thuật văn bản dài: ";

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Language detection failed. Recovered inside the detector.
    #[error("không phát hiện được ngôn ngữ: {0}")]
    Detection(String),
    /// Backend answered with a non-success status.
    #[error("API không phản hồi: {0}")]
    Api(u16),
    /// Request never produced a response.
    #[error("{0}")]
    Transport(String),
    /// Response lacked the expected structure.
    #[error("Dữ liệu trả về không hợp lệ")]
    DataFormat(String),
    /// A chunk of a long text failed; carries the first failure.
    #[error("{0}")]
    ChunkAggregate(Box<TranslateError>),
}

impl TranslateError {
    /// User-facing text, matching what the extension has always displayed.
    pub fn display_message(&self) -> String {
        match self {
            TranslateError::ChunkAggregate(inner) => format!("{CHUNKED_ERROR_PREFIX}{inner}"),
            other => format!("{ERROR_PREFIX}{other}"),
        }
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TranslateError::DataFormat(e.to_string())
        } else {
            TranslateError::Transport(e.to_string())
        }
    }
}

/// First `n` characters of `text` (char-based, never splits a code point).
pub(crate) fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
