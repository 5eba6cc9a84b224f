use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use super::{
    classify_status, classify_transport, validate_payload, ProviderFailure, ProviderPayload,
    ProviderRequest, ProviderSpec,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI Chat Completions API (and compatible servers via `base_url`).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
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
    messages: Vec<Msg<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: Option<String>,
}

impl OpenAiClient {
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
            .ok_or_else(|| ProviderFailure::Authentication("missing openai api key".into()))?;

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &request.system,
                },
                Msg {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/')))
            .header(AUTHORIZATION, format!("Bearer {key}"))
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
                ProviderFailure::MalformedResponse(format!("parse openai response: {e}"))
            })?;

        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        validate_payload(request.shape, &content)
    }
}
