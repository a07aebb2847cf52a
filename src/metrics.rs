//! Pipeline counters: cache outcomes, long-text fan-out and per-stage timing.
//! Everything is lock-free so recording never contends with the cache mutex.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Timed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Source language detection.
    Detect,
    /// One request to the translation endpoint.
    ChunkRequest,
    /// A whole successful `translate` call, cache hits included.
    Translate,
    /// One host message, decode to response.
    HostRequest,
}

#[derive(Default)]
struct StageStats {
    count: AtomicU64,
    total_us: AtomicU64,
    max_us: AtomicU64,
}

impl StageStats {
    fn record(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_us.fetch_add(us, Ordering::Relaxed);
        self.max_us.fetch_max(us, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StageSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total_us = self.total_us.load(Ordering::Relaxed);
        StageSnapshot {
            count,
            mean_us: if count == 0 { 0 } else { total_us / count },
            max_us: self.max_us.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
pub struct PipelineMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    failures: AtomicU64,
    chunked_texts: AtomicU64,
    widest_fan_out: AtomicU64,
    detect: StageStats,
    chunk_request: StageStats,
    translate: StageStats,
    host_request: StageStats,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A long text was split into `chunks` concurrent requests.
    pub fn record_fan_out(&self, chunks: usize) {
        let width = chunks as u64;
        self.chunked_texts.fetch_add(1, Ordering::Relaxed);
        self.widest_fan_out.fetch_max(width, Ordering::Relaxed);
        tracing::trace!(width, "fan-out recorded");
    }

    pub fn record(&self, stage: Stage, elapsed: Duration) {
        self.stats(stage).record(elapsed);
    }

    /// Start timing `stage`; the sample is taken by [`StageTimer::finish`].
    pub fn time(&self, stage: Stage) -> StageTimer<'_> {
        StageTimer {
            stage,
            started: Instant::now(),
            metrics: self,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            chunked_texts: self.chunked_texts.load(Ordering::Relaxed),
            widest_fan_out: self.widest_fan_out.load(Ordering::Relaxed),
            detect: self.detect.snapshot(),
            chunk_request: self.chunk_request.snapshot(),
            translate: self.translate.snapshot(),
            host_request: self.host_request.snapshot(),
        }
    }

    fn stats(&self, stage: Stage) -> &StageStats {
        match stage {
            Stage::Detect => &self.detect,
            Stage::ChunkRequest => &self.chunk_request,
            Stage::Translate => &self.translate,
            Stage::HostRequest => &self.host_request,
        }
    }
}

/// Running stage timer. Dropping it without `finish` records nothing.
pub struct StageTimer<'a> {
    stage: Stage,
    started: Instant,
    metrics: &'a PipelineMetrics,
}

impl StageTimer<'_> {
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.metrics.record(self.stage, elapsed);
        elapsed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    pub count: u64,
    pub mean_us: u64,
    pub max_us: u64,
}

/// Point-in-time copy of every counter, as served by the host `metrics` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub failures: u64,
    pub chunked_texts: u64,
    pub widest_fan_out: u64,
    pub detect: StageSnapshot,
    pub chunk_request: StageSnapshot,
    pub translate: StageSnapshot,
    pub host_request: StageSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metrics_are_zero() {
        let snapshot = PipelineMetrics::new().snapshot();
        assert_eq!(snapshot.cache_hits, 0);
        assert_eq!(snapshot.widest_fan_out, 0);
        assert_eq!(
            snapshot.translate,
            StageSnapshot {
                count: 0,
                mean_us: 0,
                max_us: 0
            }
        );
    }

    #[test]
    fn stage_stats_track_mean_and_max() {
        let metrics = PipelineMetrics::new();
        for ms in [1, 2, 6] {
            metrics.record(Stage::ChunkRequest, Duration::from_millis(ms));
        }
        let stage = metrics.snapshot().chunk_request;
        assert_eq!(stage.count, 3);
        assert_eq!(stage.mean_us, 3000);
        assert_eq!(stage.max_us, 6000);
        assert_eq!(metrics.snapshot().detect.count, 0);
    }

    #[test]
    fn fan_out_keeps_widest() {
        let metrics = PipelineMetrics::new();
        metrics.record_fan_out(3);
        metrics.record_fan_out(7);
        metrics.record_fan_out(2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunked_texts, 3);
        assert_eq!(snapshot.widest_fan_out, 7);
    }

    #[test]
    fn timer_records_only_on_finish() {
        let metrics = PipelineMetrics::new();
        drop(metrics.time(Stage::Detect));
        assert_eq!(metrics.snapshot().detect.count, 0);
        metrics.time(Stage::Detect).finish();
        assert_eq!(metrics.snapshot().detect.count, 1);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let metrics = PipelineMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["cacheHits"], 1);
        assert_eq!(json["cacheMisses"], 2);
        assert_eq!(json["hostRequest"]["meanUs"], 0);
    }
}
