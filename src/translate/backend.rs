//! Transport to the translation endpoint.
//! One GET per query; the nested-array JSON body is handed back untouched and
//! interpreted by the detector / chunk client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::TranslateError;
use crate::config::TranslatorConfig;

/// Response sections selectable through the `dt` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Plain translation segments.
    Translation,
    /// Alternatives grouped by part of speech.
    Dictionary,
    AlternateTranslations,
    Definitions,
    Transliteration,
    Synonyms,
}

impl DataType {
    pub fn as_param(self) -> &'static str {
        match self {
            DataType::Translation => "t",
            DataType::Dictionary => "bd",
            DataType::AlternateTranslations => "at",
            DataType::Definitions => "md",
            DataType::Transliteration => "rm",
            DataType::Synonyms => "ss",
        }
    }
}

/// Flags requested when translating a chunk.
pub const CHUNK_DATA_TYPES: &[DataType] = &[
    DataType::Translation,
    DataType::Dictionary,
    DataType::AlternateTranslations,
    DataType::Definitions,
    DataType::Transliteration,
    DataType::Synonyms,
];

/// Flags requested for language detection.
pub const DETECT_DATA_TYPES: &[DataType] = &[DataType::Translation];

/// A single outbound query.
#[derive(Debug, Clone, Copy)]
pub struct BackendQuery<'a> {
    pub text: &'a str,
    pub source_language: &'a str,
    pub target_language: &'a str,
    pub data_types: &'a [DataType],
}

impl BackendQuery<'_> {
    /// Query-string pairs, `dt` repeated once per data type.
    pub fn params<'p>(&'p self, client_id: &'p str) -> Vec<(&'static str, &'p str)> {
        let mut params = Vec::with_capacity(4 + self.data_types.len());
        params.push(("client", client_id));
        params.push(("sl", self.source_language));
        params.push(("tl", self.target_language));
        for dt in self.data_types {
            params.push(("dt", dt.as_param()));
        }
        params.push(("q", self.text));
        params
    }
}

/// Translation endpoint adapter. Production uses [`GoogleBackend`]; tests
/// use [`super::mock::MockBackend`].
#[async_trait]
pub trait TranslateBackend: Send + Sync {
    /// Issue one query and return the decoded JSON body.
    async fn fetch(&self, query: BackendQuery<'_>) -> Result<Value, TranslateError>;
}

/// Public `translate_a/single` endpoint client.
pub struct GoogleBackend {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl GoogleBackend {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TranslateError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            client_id: config.client_id.clone(),
        })
    }
}

#[async_trait]
impl TranslateBackend for GoogleBackend {
    async fn fetch(&self, query: BackendQuery<'_>) -> Result<Value, TranslateError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&query.params(&self.client_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or(""),
                "translation endpoint returned non-success status"
            );
            return Err(TranslateError::Api(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::DataFormat(format!("response is not JSON: {e}")))?;
        debug!(sl = query.source_language, tl = query.target_language, "endpoint responded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_params_repeat_dt_in_order() {
        let query = BackendQuery {
            text: "Hello",
            source_language: "en",
            target_language: "vi",
            data_types: CHUNK_DATA_TYPES,
        };
        let params = query.params("gtx");
        assert_eq!(params[0], ("client", "gtx"));
        assert_eq!(params[1], ("sl", "en"));
        assert_eq!(params[2], ("tl", "vi"));
        let dts: Vec<&str> = params
            .iter()
            .filter(|(k, _)| *k == "dt")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(dts, vec!["t", "bd", "at", "md", "rm", "ss"]);
        assert_eq!(params.last(), Some(&("q", "Hello")));
    }

    #[test]
    fn detect_params_only_ask_for_translation() {
        let query = BackendQuery {
            text: "Bonjour",
            source_language: "auto",
            target_language: "en",
            data_types: DETECT_DATA_TYPES,
        };
        let params = query.params("gtx");
        assert_eq!(params.iter().filter(|(k, _)| *k == "dt").count(), 1);
    }

    #[test]
    fn backend_builds_from_default_config() {
        assert!(GoogleBackend::new(&TranslatorConfig::default()).is_ok());
    }

    #[tokio::test]
    #[ignore] // hits the live endpoint
    async fn live_endpoint_translates() {
        let backend = GoogleBackend::new(&TranslatorConfig::default()).unwrap();
        let body = backend
            .fetch(BackendQuery {
                text: "Hello",
                source_language: "en",
                target_language: "vi",
                data_types: CHUNK_DATA_TYPES,
            })
            .await
            .unwrap();
        assert!(body[0].is_array());
    }
}
