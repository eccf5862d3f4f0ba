//! HTTP transport — the only place that talks to the network.
//!
//! The prober and chat code only see the `Transport` trait, so tests can
//! swap in a scripted transport and the binary uses one pooled
//! `reqwest::Client` shared by every task.

use async_trait::async_trait;
use std::time::Duration;

use crate::adapters::ProbeRequest;
use crate::error::TransportError;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request, failing with `TransportError::Timeout` once
    /// `timeout` elapses.
    async fn send(&self, req: &ProbeRequest, timeout: Duration) -> Result<HttpReply, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keyprobe/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: &ProbeRequest, timeout: Duration) -> Result<HttpReply, TransportError> {
        let mut builder = self
            .client
            .request(req.method.clone(), &req.url)
            .timeout(timeout);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpReply { status, body })
    }
}
