//! DeepSeek adapter — OpenAI-compatible API.

use http::Method;

use super::{openai_style_payload, AuthStyle, ChatEndpoint, ChatShape, ProviderProbe, AUTH_REJECTED};

const CHAT_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const MODEL: &str = "deepseek-chat";

pub fn probe() -> ProviderProbe {
    ProviderProbe {
        id: "deepseek",
        name: "DeepSeek",
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
