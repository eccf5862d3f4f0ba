//! Typed errors for the transport, report and chat layers.
//!
//! The binary converts these into `anyhow::Error` at the edges; inside the
//! prober a `TransportError` is evidence ("provider did not answer"), never
//! a reason to abort the batch.

use thiserror::Error;

/// Failure to obtain any HTTP status from a provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The per-probe deadline elapsed.
    #[error("timeout")]
    Timeout,
    /// DNS failure, refused connection, TLS handshake failure.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The catalog entry produced a URL that does not parse.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Anything else the HTTP client reported.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // Query-auth URLs carry the key, so the URL never reaches the message.
        let e = e.without_url();
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(describe(&e))
        } else if e.is_builder() {
            TransportError::InvalidUrl(describe(&e))
        } else {
            TransportError::Request(describe(&e))
        }
    }
}

/// The error and its source chain on one line.
fn describe(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Errors reading back an exported CSV report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report is empty")]
    Empty,
    #[error("unexpected header: {0}")]
    BadHeader(String),
    #[error("line {line}: {reason}")]
    BadRow { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the single-turn chat pass-through.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
    #[error("key was not confirmed by any provider ({0})")]
    Unconfirmed(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("{0} reply did not contain any text")]
    EmptyReply(String),
}
