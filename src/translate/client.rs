//! Single-chunk translation client.
//! Requests translation plus dictionary data for one chunk and flattens the
//! nested-array response into a [`TranslationResult`].

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{BackendQuery, TranslateBackend, CHUNK_DATA_TYPES};
use super::{TranslateError, TranslationResult, MAX_ALTERNATIVES_PER_TYPE};

pub struct ChunkTranslator {
    backend: Arc<dyn TranslateBackend>,
}

impl ChunkTranslator {
    pub fn new(backend: Arc<dyn TranslateBackend>) -> Self {
        Self { backend }
    }

    /// Translate one chunk. Never panics on a malformed body; structural
    /// problems come back as [`TranslateError::DataFormat`].
    pub async fn translate_chunk(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<TranslationResult, TranslateError> {
        let start = Instant::now();
        let query = BackendQuery {
            text,
            source_language,
            target_language,
            data_types: CHUNK_DATA_TYPES,
        };

        let body = self.backend.fetch(query).await.map_err(|e| {
            warn!(error = %e, sl = source_language, tl = target_language, "chunk request failed");
            e
        })?;

        let result = parse_response(&body).map_err(|e| {
            warn!(error = ?e, "chunk response rejected");
            e
        })?;

        debug!(
            chars = text.chars().count(),
            labels = result.translations_by_type.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chunk translated"
        );
        Ok(result)
    }
}

/// Parse a `translate_a/single` body.
///
/// `[0]` holds `[translated, original, ...]` segments; `[1]`, when present,
/// holds `[word, label, [[alt, ...], ...]]` groups.
pub fn parse_response(data: &Value) -> Result<TranslationResult, TranslateError> {
    let segments = data
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::DataFormat("missing translation segments at [0]".into()))?;

    let main_translation: String = segments
        .iter()
        .filter_map(|segment| non_empty_str(segment.get(0)))
        .collect();

    let mut translations_by_type: IndexMap<String, Vec<String>> = IndexMap::new();
    if let Some(groups) = data.get(1).and_then(Value::as_array) {
        for group in groups {
            let Some(label) = non_empty_str(group.get(1)) else {
                continue;
            };
            let Some(alternatives) = group.get(2).and_then(Value::as_array) else {
                continue;
            };

            let entry = translations_by_type.entry(label.to_string()).or_default();
            entry.extend(
                alternatives
                    .iter()
                    .filter_map(|alt| non_empty_str(alt.get(0)))
                    .map(str::to_string),
            );
            entry.truncate(MAX_ALTERNATIVES_PER_TYPE);
        }
    }

    Ok(TranslationResult {
        main_translation,
        translations_by_type,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
