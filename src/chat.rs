//! Single-turn chat pass-through.
//!
//! Sends one user message to the provider a key belongs to and returns the
//! reply text. The caller owns the `ChatTarget`; nothing is remembered
//! between calls.

use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::info;

use crate::adapters::{self, Catalog, ChatShape, ProbeRequest, ProviderProbe};
use crate::error::{ChatError, TransportError};
use crate::probe::{mask_key, ProbeResult, Verdict};
use crate::transport::Transport;

const ERROR_BODY_LIMIT: usize = 500;
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

/// Which key to use against which provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTarget {
    pub key: String,
    /// Catalog id or display name.
    pub provider: String,
}

impl ChatTarget {
    pub fn new(key: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            provider: provider.into(),
        }
    }

    /// Target the provider that confirmed the key in `result`.
    pub fn from_probe(result: &ProbeResult) -> Result<Self, ChatError> {
        if result.verdict != Verdict::Valid {
            return Err(ChatError::Unconfirmed(result.verdict.to_string()));
        }
        Ok(Self::new(result.key.clone(), result.provider.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub provider: String,
    pub model: String,
    pub text: String,
    pub latency_ms: u64,
}

/// Build the chat request for `probe`'s dialect.
pub fn build_chat_request(
    probe: &ProviderProbe,
    key: &str,
    model: &str,
    message: &str,
) -> Result<ProbeRequest, TransportError> {
    let url = probe.chat.url.replace("{model}", model);
    let body = match probe.chat.shape {
        ChatShape::OpenAi => json!({
            "model": model,
            "messages": [{"role": "user", "content": message}]
        }),
        ChatShape::Anthropic => json!({
            "model": model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "messages": [{"role": "user", "content": message}]
        }),
        ChatShape::Gemini => json!({
            "contents": [{"role": "user", "parts": [{"text": message}]}]
        }),
    };

    Ok(ProbeRequest {
        method: http::Method::POST,
        url: adapters::authorize_url(&url, probe.auth, key)?,
        headers: adapters::build_headers(probe, key),
        body: Some(body),
    })
}

/// Pull the reply text out of a provider response.
pub fn extract_text(shape: ChatShape, body: &Value) -> Option<String> {
    let text = match shape {
        ChatShape::OpenAi => body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
        ChatShape::Anthropic => join_texts(body["content"].as_array()?, |block| {
            (block["type"] == "text").then(|| block["text"].as_str()).flatten()
        }),
        ChatShape::Gemini => join_texts(
            body["candidates"][0]["content"]["parts"].as_array()?,
            |part| part["text"].as_str(),
        ),
    }?;
    (!text.is_empty()).then_some(text)
}

fn join_texts<'a>(items: &'a [Value], text_of: impl Fn(&'a Value) -> Option<&'a str>) -> Option<String> {
    let parts: Vec<&str> = items.iter().filter_map(text_of).collect();
    (!parts.is_empty()).then(|| parts.concat())
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Send `message` to the target's provider and return its answer.
pub async fn send_chat(
    transport: &dyn Transport,
    catalog: &Catalog,
    target: &ChatTarget,
    message: &str,
    model: Option<&str>,
    timeout: Duration,
) -> Result<ChatReply, ChatError> {
    let probe = catalog
        .find(&target.provider)
        .ok_or_else(|| ChatError::UnknownProvider(target.provider.clone()))?;
    let model = model.unwrap_or(probe.chat.default_model);

    let req = build_chat_request(probe, &target.key, model, message)?;
    let start = Instant::now();
    let reply = transport.send(&req, timeout).await?;
    let latency_ms = start.elapsed().as_millis() as u64;

    info!(
        key = %mask_key(&target.key),
        provider = probe.id,
        model,
        status = reply.status,
        latency_ms,
        "Chat reply received"
    );

    if !(200..300).contains(&reply.status) {
        return Err(ChatError::Http {
            provider: probe.name.to_string(),
            status: reply.status,
            body: truncate(&reply.body),
        });
    }

    let body: Value = serde_json::from_str(&reply.body).unwrap_or_default();
    let text = extract_text(probe.chat.shape, &body)
        .ok_or_else(|| ChatError::EmptyReply(probe.name.to_string()))?;

    Ok(ChatReply {
        provider: probe.name.to_string(),
        model: model.to_string(),
        text,
        latency_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AuthStyle, ChatEndpoint};
    use crate::probe::tests::test_probe;
    use crate::transport::testing::{Scripted, ScriptedTransport};
    use crate::transport::ReqwestTransport;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_catalog(uri: &str) -> Catalog {
        let mut openai = test_probe("p1", "P1");
        openai.chat.url = format!("{}/v1/chat/completions", uri);

        let mut anthropic = test_probe("p2", "P2");
        anthropic.auth = AuthStyle::Header("x-api-key");
        anthropic.extra_headers = vec![("anthropic-version", "2023-06-01")];
        anthropic.chat = ChatEndpoint {
            shape: ChatShape::Anthropic,
            url: format!("{}/v1/messages", uri),
            default_model: "claude-test",
        };

        let mut gemini = test_probe("p3", "P3");
        gemini.auth = AuthStyle::Query("key");
        gemini.chat = ChatEndpoint {
            shape: ChatShape::Gemini,
            url: format!("{}/v1beta/models/{{model}}:generateContent", uri),
            default_model: "gemini-test",
        };

        Catalog::new(vec![openai, anthropic, gemini])
    }

    #[tokio::test]
    async fn test_openai_shape_round_trip() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "m", "messages": [{"role": "user", "content": "Hello!"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            })))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let catalog = chat_catalog(&mock_server.uri());
        let target = ChatTarget::new("sk-test", "p1");

        let reply = send_chat(&transport, &catalog, &target, "Hello!", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply.text, "Hi there");
        assert_eq!(reply.provider, "P1");
        assert_eq!(reply.model, "m");
    }

    #[tokio::test]
    async fn test_anthropic_shape_joins_text_blocks() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"model": "claude-other", "max_tokens": 1024})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "Hello"},
                    {"type": "tool_use", "id": "x"},
                    {"type": "text", "text": " world"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let catalog = chat_catalog(&mock_server.uri());
        let target = ChatTarget::new("sk-ant-test", "P2");

        let reply = send_chat(&transport, &catalog, &target, "hi", Some("claude-other"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply.text, "Hello world");
    }

    #[tokio::test]
    async fn test_gemini_shape_uses_query_key_and_model_path() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(query_param("key", "AIza-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Bonjour"}]}}]
            })))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let catalog = chat_catalog(&mock_server.uri());
        let target = ChatTarget::new("AIza-test", "p3");

        let reply = send_chat(&transport, &catalog, &target, "hi", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply.text, "Bonjour");
        assert_eq!(reply.model, "gemini-test");
    }

    #[tokio::test]
    async fn test_http_error_is_surfaced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let catalog = chat_catalog(&mock_server.uri());
        let err = send_chat(&transport, &catalog, &ChatTarget::new("bad", "p1"), "hi", None, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            ChatError::Http { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let transport = ReqwestTransport::new().unwrap();
        let catalog = chat_catalog("http://127.0.0.1:1");
        let err = send_chat(&transport, &catalog, &ChatTarget::new("k", "nope"), "hi", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_empty_reply() {
        let transport = ScriptedTransport::new(Scripted::Reply(200, "<html>oops</html>".into()));
        let catalog = chat_catalog("https://chat.test");
        let err = send_chat(&transport, &catalog, &ChatTarget::new("k", "p1"), "hi", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyReply(ref p) if p == "P1"), "{:?}", err);
        assert_eq!(transport.calls(), vec!["https://chat.test/v1/chat/completions".to_string()]);
    }

    #[test]
    fn test_target_from_probe_requires_valid() {
        let mut result = ProbeResult {
            key: "gsk_x".into(),
            provider: "Groq".into(),
            verdict: Verdict::Valid,
            attempts: 2,
            latency_ms: 5,
            checked_at: Utc::now(),
        };
        assert_eq!(ChatTarget::from_probe(&result).unwrap(), ChatTarget::new("gsk_x", "Groq"));

        result.verdict = Verdict::RateLimited;
        assert!(matches!(ChatTarget::from_probe(&result), Err(ChatError::Unconfirmed(_))));
    }

    #[test]
    fn test_extract_text_empty_replies() {
        assert_eq!(extract_text(ChatShape::OpenAi, &json!({})), None);
        assert_eq!(
            extract_text(ChatShape::OpenAi, &json!({"choices": [{"message": {"content": ""}}]})),
            None
        );
        assert_eq!(extract_text(ChatShape::Gemini, &json!({"candidates": []})), None);
    }
}
