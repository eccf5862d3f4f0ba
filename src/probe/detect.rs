//! Prefix-based provider guess.
//!
//! An ordered list of `(predicate, provider id)` rules; the first rule that
//! matches wins, so more specific prefixes must come before `sk-`.

type Predicate = fn(&str) -> bool;

pub const PREFIX_RULES: &[(Predicate, &str)] = &[
    (is_openrouter, "openrouter"),
    (is_anthropic, "anthropic"),
    (is_groq, "groq"),
    (is_google, "google"),
    (is_openai_project, "openai"),
    (is_deepseek, "deepseek"),
    (is_openai, "openai"),
    (is_mistral, "mistral"),
];

fn is_openrouter(key: &str) -> bool {
    key.starts_with("sk-or-")
}

fn is_anthropic(key: &str) -> bool {
    key.starts_with("sk-ant-") || key.starts_with("anthropic-")
}

fn is_groq(key: &str) -> bool {
    key.starts_with("gsk_")
}

fn is_google(key: &str) -> bool {
    key.starts_with("AIza")
}

fn is_openai_project(key: &str) -> bool {
    key.starts_with("sk-proj-")
}

/// `sk-` followed by exactly 32 lowercase hex digits.
fn is_deepseek(key: &str) -> bool {
    key.strip_prefix("sk-").is_some_and(|rest| {
        rest.len() == 32
            && rest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}

fn is_openai(key: &str) -> bool {
    key.starts_with("sk-")
}

/// Mistral keys carry no prefix: 32 ASCII alphanumerics.
fn is_mistral(key: &str) -> bool {
    key.len() == 32 && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Guess the provider id for `key`, if any rule matches.
pub fn detect_provider(key: &str) -> Option<&'static str> {
    PREFIX_RULES
        .iter()
        .find(|(matches, _)| matches(key))
        .map(|(_, id)| *id)
}
