//! Anthropic Claude adapter.

use http::Method;
use serde_json::json;

use super::{AuthStyle, ChatEndpoint, ChatShape, ProviderProbe, AUTH_REJECTED};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const MODEL: &str = "claude-3-haiku-20240307";

/// Pinned API version; requests without it are rejected outright.
pub const API_VERSION: &str = "2023-06-01";

pub fn probe() -> ProviderProbe {
    ProviderProbe {
        id: "anthropic",
        name: "Anthropic",
        method: Method::POST,
        url: MESSAGES_URL.to_string(),
        auth: AuthStyle::Header("x-api-key"),
        extra_headers: vec![("anthropic-version", API_VERSION)],
        // `max_tokens` is mandatory here; without it a valid key gets a 400.
        payload: Some(json!({
            "model": MODEL,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "hi"}]
        })),
        rejection_statuses: AUTH_REJECTED,
        chat: ChatEndpoint {
            shape: ChatShape::Anthropic,
            url: MESSAGES_URL.to_string(),
            default_model: MODEL,
        },
    }
}
