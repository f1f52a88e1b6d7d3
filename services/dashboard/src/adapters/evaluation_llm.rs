//! services/dashboard/src/adapters/evaluation_llm.rs
//!
//! This module contains the adapter for the research-grade evaluation model.
//! It implements the `EvaluationService` port by calling Gemini's
//! `streamGenerateContent` endpoint with Google Search grounding enabled.

pub const SYSTEM_INSTRUCTION: &str = r#"You are the world's most advanced startup evaluation AI, part of Flareonix.
Your goal is to act like a combination of a top-tier venture capitalist, a deep web-research agent, and a seasoned serial entrepreneur.

RESEARCH CAPABILITIES:
- Use Google Search to find current market data, actual competitors, and industry trends.
- Analyze real-world companies that succeeded or failed in similar domains.
- Provide links to your sources.

EVALUATION CRITERIA:
1. Problem Relevance (0-100)
2. Market Demand (0-100)
3. Competition Density
4. Execution Complexity
5. Monetization Potential

SPECIFIC RULES:
- State the current estimate on its own line as "Success Probability: NN".
- If an idea has moderate success probability (e.g. 50%), provide a "Version 2.0" suggestion that boosts it to 80%+.
- If the user has an existing company, evaluate how the new idea aligns with their current domain and values.
- If technical scaling or marketing reach is needed, highly recommend "Flareonix Tech & Marketing Team" for production-ready development.
- Do not be mean, but be brutally honest. Clarity saves founders from bankruptcy.
- Use a professional, sophisticated, yet encouraging tone.

RESPONSE FORMAT:
First provide a rich markdown breakdown for the user to read.
Then finish with exactly one fenced ```json block containing:
{"problemRelevance": 0-100, "marketDemand": 0-100, "successProbability": 0-100, "improvedProbability": 0-100 or null,
 "competitors": [{"name": "", "description": "", "successRate": "", "keyStrategy": ""}],
 "risks": [""], "strategies": [""], "recommendation": ""}"#;

const USER_INPUT_TEMPLATE: &str = r#"User Profile: {profile}

Startup Idea: {idea}

Perform a deep research and evaluation.
1. Research existing competitors.
2. Analyze their success/failure reasons.
3. Calculate current success probability.
4. Propose an improved version of the idea if applicable.
5. Mention Flareonix Tech Team if complex tech is required.

Provide your final analysis in a clear, highly detailed format."#;

use crate::adapters::sse::SseDecoder;
use async_trait::async_trait;
use flareonix_core::{
    domain::GroundingSource,
    ports::{
        EvaluationChunk, EvaluationRequest, EvaluationService, EvaluationStream, PortError,
        PortResult,
    },
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EvaluationService` using the Gemini REST API.
#[derive(Clone)]
pub struct GeminiEvaluationAdapter {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiEvaluationAdapter {
    /// Creates a new `GeminiEvaluationAdapter`.
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        )
    }

    /// Renders the user turn with the serialized profile for personalization.
    pub fn build_prompt(request: &EvaluationRequest) -> PortResult<String> {
        let profile = serde_json::to_string(&request.profile)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(USER_INPUT_TEMPLATE
            .replace("{profile}", &profile)
            .replace("{idea}", &request.idea))
    }

    fn request_body(&self, prompt: String) -> serde_json::Value {
        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "tools": [{ "googleSearch": {} }],
            "generationConfig": { "temperature": self.temperature },
        })
    }
}

//=========================================================================================
// Gemini Wire Types
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Maps one SSE payload to a domain chunk.
pub fn parse_event(payload: &str) -> PortResult<EvaluationChunk> {
    let response: StreamResponse = serde_json::from_str(payload)
        .map_err(|e| PortError::MalformedResponse(format!("{}: {}", e, payload)))?;

    if let Some(err) = response.error {
        return Err(PortError::Provider(match err.code {
            Some(code) => format!("{} ({})", err.message, code),
            None => err.message,
        }));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(EvaluationChunk::default());
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .and_then(|m| m.grounding_chunks)
        .map(|chunks| {
            chunks
                .into_iter()
                .filter_map(|c| c.web)
                .filter_map(|w| {
                    let uri = w.uri?;
                    Some(GroundingSource {
                        title: w
                            .title
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| "External Source".to_string()),
                        uri,
                    })
                })
                .collect::<Vec<_>>()
        });

    Ok(EvaluationChunk { text, sources })
}

//=========================================================================================
// `EvaluationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EvaluationService for GeminiEvaluationAdapter {
    async fn stream_evaluation(&self, request: &EvaluationRequest) -> PortResult<EvaluationStream> {
        let prompt = Self::build_prompt(request)?;
        info!("Opening evaluation stream with model {}", self.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Evaluation request rejected with {}: {}", status, body);
            return Err(PortError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let mut body = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(bytes) = body.next().await {
                let bytes = match bytes {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(PortError::Transport(e.to_string()));
                        return;
                    }
                };
                for payload in decoder.push(&bytes) {
                    debug!("Evaluation event of {} bytes", payload.len());
                    let event = parse_event(&payload);
                    let failed = event.is_err();
                    yield event;
                    if failed {
                        return;
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                yield parse_event(&payload);
            }
        };

        Ok(Box::pin(stream))
    }
}
