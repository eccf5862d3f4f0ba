//! Classify a probe's HTTP status into what it says about the key.

use crate::adapters::ProviderProbe;

/// What one provider's answer means for the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx: the provider accepted the key.
    Valid,
    /// 429: the provider recognised the key but is throttling it.
    RateLimited,
    /// The provider's own "not my key" status; try the next one.
    Rejected,
    /// Anything else. Ends the walk with `ERROR <status>`.
    Terminal(u16),
}

pub fn classify_status(probe: &ProviderProbe, status: u16) -> Outcome {
    match status {
        200..=299 => Outcome::Valid,
        429 => Outcome::RateLimited,
        s if probe.rejects(s) => Outcome::Rejected,
        s => Outcome::Terminal(s),
    }
}
