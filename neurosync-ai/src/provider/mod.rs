//! ProviderClient: one uniform completion capability over several AI backends.
//!
//! Every variant classifies its failures into [`ProviderFailure`] and validates
//! the payload against the requested [`ResponseShape`] before returning it.

mod anthropic;
mod openai;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

/// Shape the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Non-empty free text.
    Text,
    /// Numbered or bulleted list with at least `min` items; extra items past
    /// `max` are dropped.
    StepList { min: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub system: String,
    pub prompt: String,
    pub shape: ResponseShape,
    pub timeout: Duration,
}

impl ProviderRequest {
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        shape: ResponseShape,
        timeout: Duration,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            shape,
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPayload {
    Text(String),
    Steps(Vec<String>),
}

impl ProviderPayload {
    /// Flattened text form.
    pub fn text(&self) -> String {
        match self {
            ProviderPayload::Text(t) => t.clone(),
            ProviderPayload::Steps(steps) => steps
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn steps(&self) -> &[String] {
        match self {
            ProviderPayload::Steps(steps) => steps,
            ProviderPayload::Text(_) => &[],
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderFailure::Timeout(_) => "timeout",
            ProviderFailure::RateLimited { .. } => "rate_limited",
            ProviderFailure::Authentication(_) => "authentication",
            ProviderFailure::MalformedResponse(_) => "malformed_response",
            ProviderFailure::Unavailable(_) => "unavailable",
        }
    }
}

/// Completion capability the gateway fails over between.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Stable name for logs and annotations, e.g. "openai:gpt-4o-mini".
    fn name(&self) -> &str;

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderPayload, ProviderFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

impl ProviderSpec {
    pub fn anthropic(model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            model: model.into(),
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }

    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            model: model.into(),
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}:{}", self.kind, self.model)
    }
}

/// Fixed set of backends; the gateway's priority list picks between them.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    Anthropic(AnthropicClient),
    OpenAi(OpenAiClient),
}

impl ProviderClient {
    /// A missing key still yields a client; its calls fail as authentication
    /// errors so the gateway moves on.
    pub fn from_spec(spec: &ProviderSpec, api_key: Option<String>) -> Self {
        let http = reqwest::Client::new();
        match spec.kind {
            ProviderKind::Anthropic => {
                ProviderClient::Anthropic(AnthropicClient::new(http, spec, api_key))
            }
            ProviderKind::OpenAi => ProviderClient::OpenAi(OpenAiClient::new(http, spec, api_key)),
        }
    }
}

#[async_trait]
impl CompletionBackend for ProviderClient {
    fn name(&self) -> &str {
        match self {
            ProviderClient::Anthropic(c) => c.name(),
            ProviderClient::OpenAi(c) => c.name(),
        }
    }

    async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderPayload, ProviderFailure> {
        match self {
            ProviderClient::Anthropic(c) => c.complete(request).await,
            ProviderClient::OpenAi(c) => c.complete(request).await,
        }
    }
}

/// Check raw completion text against the requested shape.
pub fn validate_payload(
    shape: ResponseShape,
    raw: &str,
) -> Result<ProviderPayload, ProviderFailure> {
    let raw = raw.trim();
    match shape {
        ResponseShape::Text => {
            if raw.is_empty() {
                return Err(ProviderFailure::MalformedResponse("empty completion".into()));
            }
            Ok(ProviderPayload::Text(raw.to_string()))
        }
        ResponseShape::StepList { min, max } => {
            let mut steps: Vec<String> = raw.lines().filter_map(strip_list_marker).collect();
            if steps.len() < min {
                return Err(ProviderFailure::MalformedResponse(format!(
                    "expected at least {min} steps, got {}",
                    steps.len()
                )));
            }
            steps.truncate(max.max(min));
            Ok(ProviderPayload::Steps(steps))
        }
    }
}

/// "1. foo", "2) foo", "- foo", "* foo", "• foo" -> "foo".
fn strip_list_marker(line: &str) -> Option<String> {
    let line = line.trim();
    let rest = if let Some(r) = line.strip_prefix(['-', '*', '•']) {
        r
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        line[digits..].strip_prefix(['.', ')'])?
    };
    let rest = rest.trim();
    if rest.is_empty() { None } else { Some(rest.to_string()) }
}

/// Map a non-success HTTP status to a failure class.
pub(crate) fn classify_status(
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> ProviderFailure {
    let snippet: String = body.chars().take(200).collect();
    match status {
        429 => ProviderFailure::RateLimited {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        401 | 403 => ProviderFailure::Authentication(format!("{status} {snippet}")),
        408 | 504 => ProviderFailure::Timeout(Duration::ZERO),
        _ => ProviderFailure::Unavailable(format!("{status} {snippet}")),
    }
}

pub(crate) fn classify_transport(err: &reqwest::Error, timeout: Duration) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::Timeout(timeout)
    } else if err.is_decode() {
        ProviderFailure::MalformedResponse(err.to_string())
    } else {
        ProviderFailure::Unavailable(err.to_string())
    }
}
