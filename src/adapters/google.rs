//! Google Gemini adapter — generativelanguage REST API.
//!
//! The probe lists models (free, no tokens consumed). The key travels in
//! the `key` query parameter, and an unknown key is answered with
//! 400 `API_KEY_INVALID` rather than 401.

use http::Method;

use super::{AuthStyle, ChatEndpoint, ChatShape, ProviderProbe};

const MODELS_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const CHAT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";
const MODEL: &str = "gemini-2.0-flash-lite";

pub fn probe() -> ProviderProbe {
    ProviderProbe {
        id: "google",
        name: "Google Gemini",
        method: Method::GET,
        url: MODELS_URL.to_string(),
        auth: AuthStyle::Query("key"),
        extra_headers: Vec::new(),
        payload: None,
        rejection_statuses: &[400, 401, 403],
        chat: ChatEndpoint {
            shape: ChatShape::Gemini,
            url: CHAT_URL.to_string(),
            default_model: MODEL,
        },
    }
}
