//! Message host: line-delimited JSON requests on stdin, one response line per
//! request on stdout. Requests are handled concurrently; a single writer task
//! owns stdout so lines never interleave.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

use crate::metrics::Stage;
use crate::translate::{
    TranslateRequest, TranslationResult, TranslationService, AUTO_LANGUAGE,
    DEFAULT_TARGET_LANGUAGE,
};

/// One inbound message from the extension.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMessage {
    #[serde(default)]
    pub id: Option<Value>,
    pub action: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub source_language: Option<String>,
}

/// Re-shape a result into the `matches` payload the popup renders: the main
/// translation first, then one entry per part-of-speech label.
pub fn matches_response(result: &TranslationResult) -> Value {
    let mut matches = Vec::with_capacity(1 + result.translations_by_type.len());
    matches.push(json!({ "translation": result.main_translation }));
    for alternatives in result.translations_by_type.values() {
        matches.push(json!({ "partOfSpeech": alternatives.join(", ") }));
    }
    json!({ "translation": { "matches": matches } })
}

fn error_response(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Handle one decoded message.
pub async fn handle_message(service: &TranslationService, message: HostMessage) -> Value {
    let mut response = match message.action.as_str() {
        "translate" => {
            let request = TranslateRequest {
                text: message.text.unwrap_or_default(),
                target_language: message
                    .target_language
                    .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string()),
                source_language: message
                    .source_language
                    .unwrap_or_else(|| AUTO_LANGUAGE.to_string()),
            };
            let result = service.translate_for_display(&request).await;
            matches_response(&result)
        }
        "metrics" => json!({ "metrics": service.metrics().snapshot() }),
        "save-translation" | "refresh" => {
            error_response(format!("action {:?} is not handled by this host", message.action))
        }
        other => error_response(format!("unknown action: {other}")),
    };

    if let (Some(id), Some(obj)) = (message.id, response.as_object_mut()) {
        obj.insert("id".to_string(), id);
    }
    response
}

/// Decode and handle one raw input line.
pub async fn handle_line(service: &TranslationService, line: &str) -> Value {
    match serde_json::from_str::<HostMessage>(line) {
        Ok(message) => handle_message(service, message).await,
        Err(e) => {
            warn!(error = %e, "malformed host message");
            error_response(format!("malformed message: {e}"))
        }
    }
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(
    service: Arc<TranslationService>,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    let writer_task = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let mut line = response.to_string();
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = reader.lines();
    let mut handlers = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        reap_finished(&mut handlers);
        if line.trim().is_empty() {
            continue;
        }
        let span = tracing::info_span!("host_request", request_id = %uuid::Uuid::new_v4());
        let service = Arc::clone(&service);
        let tx = tx.clone();
        handlers.spawn(
            async move {
                let timer = service.metrics().time(Stage::HostRequest);
                let response = handle_line(&service, &line).await;
                timer.finish();
                if tx.send(response).is_err() {
                    warn!("response writer closed");
                }
                debug!("host request handled");
            }
            .instrument(span),
        );
    }

    while let Some(outcome) = handlers.join_next().await {
        if let Err(e) = outcome {
            warn!(error = %e, "host request task failed");
        }
    }
    drop(tx);

    match writer_task.await {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "response writer task failed"),
    }
    info!("input closed, host exiting");
    Ok(())
}

/// Drop handlers that already finished, so a long-lived host only holds
/// tasks still in flight. Returns how many were collected.
fn reap_finished(handlers: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(outcome) = handlers.try_join_next() {
        if let Err(e) = outcome {
            warn!(error = %e, "host request task failed");
        }
        reaped += 1;
    }
    reaped
}
