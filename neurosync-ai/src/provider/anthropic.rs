use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use super::{
    classify_status, classify_transport, validate_payload, ProviderFailure, ProviderPayload,
    ProviderRequest, ProviderSpec,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    name: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f64,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    t: String,
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, spec: &ProviderSpec, api_key: Option<String>) -> Self {
        Self {
            http,
            name: spec.name(),
            model: spec.model.clone(),
            base_url: spec
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens: spec.max_tokens,
            temperature: spec.temperature,
            api_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderPayload, ProviderFailure> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderFailure::Authentication("missing anthropic api key".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(key).map_err(|_| {
                ProviderFailure::Authentication("api key is not a valid header".into())
            })?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = Req {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: &request.system,
            messages: vec![Msg {
                role: "user",
                content: &request.prompt,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .headers(headers)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e, request.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let txt = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), retry_after.as_deref(), &txt));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| {
                ProviderFailure::MalformedResponse(format!("parse anthropic response: {e}"))
            })?;

        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }

        validate_payload(request.shape, &s)
    }
}
