//! Key classifier & prober.
//!
//! For one key, walks catalog entries sequentially and stops at the first
//! definitive answer. Providers are never tried in parallel for the same
//! key: once a verdict is reached the remaining probes are pure cost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::adapters::{self, Catalog, ProviderProbe};
use crate::error::TransportError;
use crate::transport::Transport;

pub mod classify;
pub mod detect;

use classify::{classify_status, Outcome};

/// Provider name reported when no catalog entry claimed the key.
pub const UNKNOWN_PROVIDER: &str = "Unknown";

// ── Types ───────────────────────────────────────────────────────────

/// A raw key as submitted. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    raw: String,
}

impl KeyRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn masked(&self) -> String {
        mask_key(&self.raw)
    }
}

/// Mask a key for display: "sk-ant-0123456789" → "sk-a...6789".
///
/// At most a quarter of the key shows on each side; keys shorter than 12
/// characters show only their head.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let shown = (chars.len() / 4).min(4);
    let head: String = chars[..shown].iter().collect();
    if chars.len() < 12 {
        return format!("{}...", head);
    }
    let tail: String = chars[chars.len() - shown..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Final classification of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Verdict {
    Valid,
    Invalid,
    RateLimited,
    /// Status code or transport message.
    Error(String),
    Unknown,
}

impl Verdict {
    pub fn http_error(status: u16) -> Self {
        Verdict::Error(status.to_string())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => f.write_str("VALID"),
            Verdict::Invalid => f.write_str("INVALID"),
            Verdict::RateLimited => f.write_str("RATE LIMITED"),
            Verdict::Error(detail) if detail.is_empty() => f.write_str("ERROR"),
            Verdict::Error(detail) => write!(f, "ERROR {}", detail),
            Verdict::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised status '{0}'")]
pub struct ParseVerdictError(pub String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALID" => Ok(Verdict::Valid),
            "INVALID" => Ok(Verdict::Invalid),
            "RATE LIMITED" => Ok(Verdict::RateLimited),
            "UNKNOWN" => Ok(Verdict::Unknown),
            "ERROR" => Ok(Verdict::Error(String::new())),
            other => other
                .strip_prefix("ERROR ")
                .map(|detail| Verdict::Error(detail.to_string()))
                .ok_or_else(|| ParseVerdictError(other.to_string())),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        v.to_string()
    }
}

impl TryFrom<String> for Verdict {
    type Error = ParseVerdictError;

    fn try_from(s: String) -> Result<Self, ParseVerdictError> {
        s.parse()
    }
}

/// Outcome of classifying one key.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub key: String,
    pub provider: String,
    #[serde(rename = "status")]
    pub verdict: Verdict,
    /// Probes actually sent for this key.
    pub attempts: u32,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}

/// How a key is matched to providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProbeMode {
    /// Try every catalog entry in order until one is definitive.
    #[default]
    Exhaustive,
    /// Guess one provider from the key prefix and probe it once.
    Prefix,
    /// Exhaustive, but the prefix-guessed provider goes first.
    Hinted,
}

// ── Prober ──────────────────────────────────────────────────────────

/// Classifies keys against a catalog. Cheap to clone; clones share the
/// transport (and therefore its connection pool).
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    catalog: Arc<Catalog>,
    timeout: Duration,
    mode: ProbeMode,
}

impl Prober {
    pub fn new(
        transport: Arc<dyn Transport>,
        catalog: Arc<Catalog>,
        timeout: Duration,
        mode: ProbeMode,
    ) -> Self {
        Self {
            transport,
            catalog,
            timeout,
            mode,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    /// Classify one key. Never fails: every problem becomes a verdict.
    pub async fn probe_key(&self, key: &KeyRecord) -> ProbeResult {
        let start = Instant::now();

        let (provider, verdict, attempts) = match self.mode {
            ProbeMode::Exhaustive => self.walk(key, self.catalog.ordered_with_first(None)).await,
            ProbeMode::Hinted => {
                let hint = detect::detect_provider(key.as_str());
                self.walk(key, self.catalog.ordered_with_first(hint)).await
            }
            ProbeMode::Prefix => self.single_shot(key).await,
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(
            key = %key.masked(),
            provider = %provider,
            status = %verdict,
            attempts,
            latency_ms,
            "Key classified"
        );

        ProbeResult {
            key: key.as_str().to_string(),
            provider,
            verdict,
            attempts,
            latency_ms,
            checked_at: Utc::now(),
        }
    }

    /// Send one probe and return its status, bounded by the per-probe
    /// timeout even if the transport ignores its own deadline.
    async fn attempt(&self, probe: &ProviderProbe, key: &str) -> Result<u16, TransportError> {
        let req = adapters::build_request(probe, key)?;
        match tokio::time::timeout(self.timeout, self.transport.send(&req, self.timeout)).await {
            Ok(reply) => reply.map(|r| r.status),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn walk(&self, key: &KeyRecord, order: Vec<&ProviderProbe>) -> (String, Verdict, u32) {
        let mut attempts = 0u32;
        let mut answered = false;

        for probe in order {
            attempts += 1;
            match self.attempt(probe, key.as_str()).await {
                Ok(status) => {
                    answered = true;
                    let outcome = classify_status(probe, status);
                    debug!(key = %key.masked(), provider = probe.id, status, ?outcome, "Probe answered");
                    match outcome {
                        Outcome::Valid => return (probe.name.to_string(), Verdict::Valid, attempts),
                        Outcome::RateLimited => {
                            return (probe.name.to_string(), Verdict::RateLimited, attempts)
                        }
                        Outcome::Terminal(code) => {
                            return (probe.name.to_string(), Verdict::http_error(code), attempts)
                        }
                        Outcome::Rejected => {}
                    }
                }
                Err(e) => {
                    debug!(key = %key.masked(), provider = probe.id, error = %e, "Provider unreachable — trying next");
                }
            }
        }

        let verdict = if answered { Verdict::Invalid } else { Verdict::Unknown };
        (UNKNOWN_PROVIDER.to_string(), verdict, attempts)
    }

    async fn single_shot(&self, key: &KeyRecord) -> (String, Verdict, u32) {
        let probe = match detect::detect_provider(key.as_str()).and_then(|id| self.catalog.find(id)) {
            Some(p) => p,
            None => {
                debug!(key = %key.masked(), "No prefix rule matched");
                return (UNKNOWN_PROVIDER.to_string(), Verdict::Unknown, 0);
            }
        };

        let verdict = match self.attempt(probe, key.as_str()).await {
            Ok(status) => match classify_status(probe, status) {
                Outcome::Valid => Verdict::Valid,
                Outcome::RateLimited => Verdict::RateLimited,
                Outcome::Rejected => Verdict::Invalid,
                Outcome::Terminal(code) => Verdict::http_error(code),
            },
            Err(e) => Verdict::Error(e.to_string()),
        };
        (probe.name.to_string(), verdict, 1)
    }
}
