//! Google Gemini API provider (`generateContent`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::AgentreeConfig;
use crate::error::{AgentreeError, Result};
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::http::{build_client, status_to_error, transport_error};
use super::{ModelProvider, ModelRequest, ModelResponse, ToolDeclaration};

/// Built-in Gemini tool names understood by [`GoogleProvider`].
pub const GOOGLE_SEARCH: &str = "google_search";

pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl GoogleProvider {
    pub fn new(config: &AgentreeConfig) -> Result<Self> {
        if !config.has_credentials() {
            tracing::warn!("no Gemini API key configured; model calls will be rejected upstream");
        }
        Ok(Self {
            client: build_client(config.request_timeout_secs)?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.request_timeout_secs,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_once(&self, url: &str, body: &Value) -> Result<GeminiResponse> {
        let mut req = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.query(&[("key", key)]);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        resp.json::<GeminiResponse>()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))
    }

    pub(crate) fn build_request_body(request: &ModelRequest) -> Value {
        let contents: Vec<Value> = request
            .contents
            .iter()
            .filter(|c| !c.is_empty())
            .map(|content| {
                // Gemini only accepts user/model; function responses ride on user turns.
                let role = match content.role {
                    Role::Model => "model",
                    Role::User | Role::Function => "user",
                };
                json!({ "role": role, "parts": build_gemini_parts(&content.parts) })
            })
            .collect();

        let mut body = Map::new();
        body.insert("contents".into(), Value::Array(contents));

        if let Some(sys) = request.system_instruction.as_deref().filter(|s| !s.is_empty()) {
            body.insert("systemInstruction".into(), json!({ "parts": [{ "text": sys }] }));
        }

        let mut gen_config = Map::new();
        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            gen_config.insert("topP".into(), top_p.into());
        }
        if let Some(top_k) = settings.top_k {
            gen_config.insert("topK".into(), top_k.into());
        }
        if let Some(ref stops) = settings.stop_sequences {
            gen_config.insert("stopSequences".into(), json!(stops));
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), Value::Object(gen_config));
        }

        let mut tools = Vec::new();
        let fn_decls: Vec<Value> = request
            .tools
            .iter()
            .filter_map(|t| match t {
                ToolDeclaration::Function {
                    name,
                    description,
                    parameters,
                } => Some(json!({
                    "name": name,
                    "description": description,
                    "parameters": parameters,
                })),
                ToolDeclaration::Builtin { .. } => None,
            })
            .collect();
        if !fn_decls.is_empty() {
            tools.push(json!({ "functionDeclarations": fn_decls }));
        }
        for tool in &request.tools {
            if let ToolDeclaration::Builtin { name } = tool {
                match name.as_str() {
                    GOOGLE_SEARCH => tools.push(json!({ "googleSearch": {} })),
                    other => debug!(tool = other, "skipping unsupported built-in tool"),
                }
            }
        }
        if !tools.is_empty() {
            body.insert("tools".into(), Value::Array(tools));
        }

        Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let body = Self::build_request_body(request);
        let url = self.endpoint(&request.model);

        debug!(model = %request.model, contents = request.contents.len(), "Gemini generateContent");

        let data = self
            .retry
            .execute(|| self.generate_once(&url, &body))
            .await?;

        into_model_response(data)
    }
}

fn build_gemini_parts(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => json!({ "text": text }),
            Part::FunctionCall(call) => json!({
                "functionCall": { "id": call.id, "name": call.name, "args": call.args }
            }),
            Part::FunctionResponse(resp) => json!({
                "functionResponse": { "id": resp.id, "name": resp.name, "response": resp.response }
            }),
        })
        .collect()
}

fn into_model_response(data: GeminiResponse) -> Result<ModelResponse> {
    let usage = data
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    let Some(candidate) = data.candidates.into_iter().next() else {
        if let Some(reason) = data.prompt_feedback.and_then(|f| f.block_reason) {
            return Ok(ModelResponse {
                usage,
                ..ModelResponse::blocked(format!("prompt blocked: {reason}"))
            });
        }
        return Err(AgentreeError::api(200, "No candidates in Gemini response"));
    };

    let mut parts = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            // Gemini splits long answers into consecutive text parts.
            if let Some(Part::Text { text: prev }) = parts.last_mut() {
                prev.push_str(&text);
            } else {
                parts.push(Part::text(text));
            }
        }
        if let Some(fc) = part.function_call {
            parts.push(Part::FunctionCall(FunctionCall {
                id: fc.id.unwrap_or_else(|| format!("call-{}", uuid::Uuid::new_v4())),
                name: fc.name,
                args: fc.args.unwrap_or_else(|| Value::Object(Map::new())),
            }));
        }
    }

    let finish_reason = candidate.finish_reason.as_deref().map(|r| match r {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    });

    let block_reason = (parts.is_empty() && finish_reason == Some(FinishReason::ContentFilter))
        .then(|| format!("response blocked: {}", candidate.finish_reason.unwrap_or_default()));

    Ok(ModelResponse {
        content: Content::new(Role::Model, parts),
        finish_reason,
        usage,
        block_reason,
    })
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    id: Option<String>,
    name: String,
    args: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GeminiUsage {
    prompt_token_count: u32,
    candidates_token_count: u32,
    total_token_count: u32,
}
