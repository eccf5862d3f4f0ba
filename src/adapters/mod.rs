//! Provider catalog — the static, ordered list of probe definitions.
//!
//! Each provider lives in its own file and contributes one
//! `ProviderProbe`. Entries are plain data: building headers, URLs and
//! request bodies for a key is done by the pure functions below, so no
//! entry ever captures a key.

use std::collections::BTreeMap;

use http::Method;
use serde_json::{json, Value};

use crate::error::TransportError;

pub mod anthropic;
pub mod deepseek;
pub mod google;
pub mod groq;
pub mod mistral;
pub mod openai;
pub mod openrouter;

/// Statuses almost every provider uses to reject a key.
pub const AUTH_REJECTED: &[u16] = &[401, 403];

// ── Core Types ──────────────────────────────────────────────────────

/// Where the key goes in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// A custom header carrying the raw key (e.g. `x-api-key`).
    Header(&'static str),
    /// The key is embedded in the URL as a query parameter.
    Query(&'static str),
}

/// Request/response dialect spoken by a provider's chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatShape {
    /// `/chat/completions` with `choices[0].message.content`.
    OpenAi,
    /// `/v1/messages` with `content[0].text`.
    Anthropic,
    /// `:generateContent` with `candidates[0].content.parts[0].text`.
    Gemini,
}

/// Chat endpoint of a provider. `url` may contain a `{model}` placeholder.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    pub shape: ChatShape,
    pub url: String,
    pub default_model: &'static str,
}

/// One provider's fixed probe definition.
#[derive(Debug, Clone)]
pub struct ProviderProbe {
    /// Stable identifier (e.g. "groq").
    pub id: &'static str,
    /// Display name used in reports (e.g. "Groq").
    pub name: &'static str,
    pub method: Method,
    pub url: String,
    pub auth: AuthStyle,
    /// Static headers sent with every request (e.g. API version pins).
    pub extra_headers: Vec<(&'static str, &'static str)>,
    /// Minimal body; `None` for GET probes.
    pub payload: Option<Value>,
    /// Statuses meaning "this provider does not accept the key".
    pub rejection_statuses: &'static [u16],
    pub chat: ChatEndpoint,
}

impl ProviderProbe {
    pub fn rejects(&self, status: u16) -> bool {
        self.rejection_statuses.contains(&status)
    }
}

/// A fully built request, ready for a `Transport`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

// ── Request Building ────────────────────────────────────────────────

/// Minimal OpenAI-compatible chat body used as a liveness probe.
pub fn openai_style_payload(model: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": "hi"}],
        "max_tokens": 1
    })
}

/// Auth and static headers for `key` against `probe`.
pub fn build_headers(probe: &ProviderProbe, key: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    match probe.auth {
        AuthStyle::Bearer => {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        AuthStyle::Header(name) => {
            headers.insert(name.to_string(), key.to_string());
        }
        AuthStyle::Query(_) => {}
    }
    for (name, value) in &probe.extra_headers {
        headers.insert(name.to_string(), value.to_string());
    }
    headers
}

/// Embed the key into `url` when the auth style asks for it.
pub fn authorize_url(url: &str, auth: AuthStyle, key: &str) -> Result<String, TransportError> {
    match auth {
        AuthStyle::Query(param) => {
            let mut parsed = reqwest::Url::parse(url)
                .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;
            parsed.query_pairs_mut().append_pair(param, key);
            Ok(parsed.into())
        }
        AuthStyle::Bearer | AuthStyle::Header(_) => Ok(url.to_string()),
    }
}

/// Final probe URL for `key`.
pub fn build_url(probe: &ProviderProbe, key: &str) -> Result<String, TransportError> {
    authorize_url(&probe.url, probe.auth, key)
}

/// The complete probe request for `key`.
pub fn build_request(probe: &ProviderProbe, key: &str) -> Result<ProbeRequest, TransportError> {
    Ok(ProbeRequest {
        method: probe.method.clone(),
        url: build_url(probe, key)?,
        headers: build_headers(probe, key),
        body: probe.payload.clone(),
    })
}

// ── Catalog ─────────────────────────────────────────────────────────

/// Ordered list of probes. Order is probing order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ProviderProbe>,
}

impl Catalog {
    pub fn new(entries: Vec<ProviderProbe>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProviderProbe] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Case-insensitive lookup by id or display name.
    pub fn find(&self, id_or_name: &str) -> Option<&ProviderProbe> {
        self.entries.iter().find(|p| {
            p.id.eq_ignore_ascii_case(id_or_name) || p.name.eq_ignore_ascii_case(id_or_name)
        })
    }

    /// Catalog order, with `first` (if present) moved to the front.
    pub fn ordered_with_first(&self, first: Option<&str>) -> Vec<&ProviderProbe> {
        let mut ordered: Vec<&ProviderProbe> = Vec::with_capacity(self.entries.len());
        if let Some(hint) = first.and_then(|id| self.find(id)) {
            ordered.push(hint);
        }
        for probe in &self.entries {
            if !ordered.iter().any(|p| p.id == probe.id) {
                ordered.push(probe);
            }
        }
        ordered
    }
}

impl Default for Catalog {
    fn default() -> Self {
        catalog()
    }
}

/// The built-in catalog, in probing order.
pub fn catalog() -> Catalog {
    Catalog::new(vec![
        openrouter::probe(),
        groq::probe(),
        google::probe(),
        anthropic::probe(),
        mistral::probe(),
        deepseek::probe(),
        openai::probe(),
    ])
}
