//! OpenAI adapter. Last in probing order: its `sk-` prefix overlaps with
//! several OpenAI-compatible providers tried earlier.

use http::Method;

use super::{openai_style_payload, AuthStyle, ChatEndpoint, ChatShape, ProviderProbe, AUTH_REJECTED};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";

pub fn probe() -> ProviderProbe {
    ProviderProbe {
        id: "openai",
        name: "OpenAI",
        method: Method::POST,
        url: CHAT_URL.to_string(),
        auth: AuthStyle::Bearer,
        extra_headers: Vec::new(),
        payload: Some(openai_style_payload(MODEL)),
        rejection_statuses: AUTH_REJECTED,
        chat: ChatEndpoint {
            shape: ChatShape::OpenAi,
            url: CHAT_URL.to_string(),
            default_model: MODEL,
        },
    }
}
