//! Batch runner — classifies every submitted key concurrently.
//!
//! One task per key, all sharing the prober's transport. Keys never wait
//! on each other; the only coordination is the optional concurrency
//! bound and the final gather, which returns results in input order.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, Instrument};

use crate::probe::{KeyRecord, ProbeResult, Prober, Verdict, UNKNOWN_PROVIDER};

/// Parse newline-separated keys. Lines are trimmed; blank lines dropped;
/// duplicates kept so every submitted line gets a row.
pub fn parse_keys(text: &str) -> Vec<KeyRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(KeyRecord::new)
        .collect()
}

/// Verdict counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub rate_limited: usize,
    pub error: usize,
    pub unknown: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match r.verdict {
                Verdict::Valid => summary.valid += 1,
                Verdict::Invalid => summary.invalid += 1,
                Verdict::RateLimited => summary.rate_limited += 1,
                Verdict::Error(_) => summary.error += 1,
                Verdict::Unknown => summary.unknown += 1,
            }
        }
        summary
    }
}

/// Classify all `keys`. `concurrency == 0` means one task per key with
/// no bound; otherwise at most `concurrency` keys are probed at once.
pub async fn run_batch(prober: &Prober, keys: Vec<KeyRecord>, concurrency: usize) -> Vec<ProbeResult> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("batch", %run_id);
    let limiter = (concurrency > 0).then(|| Arc::new(Semaphore::new(concurrency)));
    let scan_start = Utc::now();

    info!(
        parent: &span,
        keys = keys.len(),
        providers = prober.catalog().len(),
        mode = ?prober.mode(),
        timeout_ms = prober.timeout().as_millis() as u64,
        "Starting batch"
    );

    let mut handles = Vec::with_capacity(keys.len());
    for key in &keys {
        let prober = prober.clone();
        let key = key.clone();
        let limiter = limiter.clone();

        handles.push(tokio::spawn(
            async move {
                // Held until this key is done; closed semaphores never happen here.
                let _permit = match &limiter {
                    Some(sem) => sem.clone().acquire_owned().await.ok(),
                    None => None,
                };
                prober.probe_key(&key).await
            }
            .instrument(span.clone()),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (handle, key) in handles.into_iter().zip(&keys) {
        results.push(handle.await.unwrap_or_else(|e| {
            error!(parent: &span, key = %key.masked(), "Probe task failed: {}", e);
            ProbeResult {
                key: key.as_str().to_string(),
                provider: UNKNOWN_PROVIDER.to_string(),
                verdict: Verdict::Unknown,
                attempts: 0,
                latency_ms: 0,
                checked_at: Utc::now(),
            }
        }));
    }

    let summary = BatchSummary::from_results(&results);
    info!(
        parent: &span,
        total = summary.total,
        valid = summary.valid,
        invalid = summary.invalid,
        rate_limited = summary.rate_limited,
        error = summary.error,
        unknown = summary.unknown,
        duration_ms = (Utc::now() - scan_start).num_milliseconds(),
        "Batch complete"
    );

    results
}
