//! Scripted backend for tests: no network, records every query it sees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::backend::{BackendQuery, DataType, TranslateBackend, DETECT_DATA_TYPES};
use super::TranslateError;

/// Owned copy of a [`BackendQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub data_types: Vec<DataType>,
}

impl RecordedQuery {
    /// Detection queries only ask for `dt=t`.
    pub fn is_detection(&self) -> bool {
        self.data_types == DETECT_DATA_TYPES
    }
}

type Responder = dyn Fn(&RecordedQuery) -> Result<Value, TranslateError> + Send + Sync;

pub struct MockBackend {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedQuery>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockBackend {
    pub fn new(
        responder: impl Fn(&RecordedQuery) -> Result<Value, TranslateError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            delay: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Translates to `"[<tl>] <text>"`, detects everything as `en`.
    pub fn echo() -> Self {
        Self::new(|q| {
            if q.is_detection() {
                Ok(detection_body("en"))
            } else {
                Ok(translation_body(&format!("[{}] {}", q.target_language, q.text), &[]))
            }
        })
    }

    /// Fails every query.
    pub fn failing(error: impl Fn() -> TranslateError + Send + Sync + 'static) -> Self {
        Self::new(move |_| Err(error()))
    }

    /// Delay each response, so concurrent calls overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn translation_calls(&self) -> usize {
        self.calls.lock().iter().filter(|q| !q.is_detection()).count()
    }

    pub fn detection_calls(&self) -> usize {
        self.calls.lock().iter().filter(|q| q.is_detection()).count()
    }

    /// Most queries that were ever awaiting a response at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslateBackend for MockBackend {
    async fn fetch(&self, query: BackendQuery<'_>) -> Result<Value, TranslateError> {
        let recorded = RecordedQuery {
            text: query.text.to_string(),
            source_language: query.source_language.to_string(),
            target_language: query.target_language.to_string(),
            data_types: query.data_types.to_vec(),
        };
        self.calls.lock().push(recorded.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(&recorded)
    }
}

/// Body shaped like a detection response.
pub fn detection_body(language: &str) -> Value {
    json!([[["x", "x", null, null, 1]], null, language])
}

/// Body with one segment and the given `(label, alternatives)` groups.
pub fn translation_body(main: &str, groups: &[(&str, Vec<&str>)]) -> Value {
    let groups: Vec<Value> = groups
        .iter()
        .map(|(label, alts)| {
            let alts: Vec<Value> = alts.iter().map(|a| json!([a])).collect();
            json!(["word", label, alts])
        })
        .collect();
    json!([[[main, "source"]], groups])
}
