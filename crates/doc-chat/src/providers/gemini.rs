//! Gemini API client (API key authentication)
//!
//! Used for answers (`generateContent`, optionally with the source document
//! attached as inline data) and for embeddings (`embedContent`).

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GeminiConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::retrieval::Attachment;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::RetryPolicy;

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: GeminiConfig,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &GeminiConfig, llm: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("Gemini backend requires an API key (set GOOGLE_API_KEY)".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
            temperature: llm.temperature,
            retry: RetryPolicy::new(llm.max_retries),
        })
    }

    /// Override the retry schedule
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    /// Describe a failed response, calling out rate limiting
    async fn failure(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS {
            format!("rate limited by Gemini (HTTP 429): {}", body)
        } else {
            format!("HTTP {} - {}", status, body)
        }
    }

    /// Check the generation model is reachable with this key
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.generation_model
        );
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an answer, attaching the document as inline data when given
    pub async fn generate(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String> {
        let url = self.model_url(&self.config.generation_model, "generateContent");

        let mut parts = Vec::with_capacity(2);
        if let Some(attachment) = attachment {
            parts.push(Part {
                inline_data: Some(InlineData {
                    mime_type: attachment.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&attachment.bytes),
                }),
                text: None,
            });
        }
        parts.push(Part {
            inline_data: None,
            text: Some(prompt.to_string()),
        });

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        tracing::info!(
            "Generating answer with model: {} (attachment: {})",
            self.config.generation_model,
            attachment.is_some()
        );

        self.retry
            .run("Gemini generation", || async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::model(format!("Gemini request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::model(format!(
                        "Gemini generation failed: {}",
                        Self::failure(response).await
                    )));
                }

                let gen_response: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::model(format!("Failed to parse Gemini response: {}", e)))?;

                let text: String = gen_response
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content)
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("")
                    })
                    .unwrap_or_default();

                if text.is_empty() {
                    return Err(Error::model("No text in Gemini response"));
                }
                Ok(text)
            })
            .await
    }

    /// Embed one text with the configured embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = &self.config.embedding_model;
        let url = self.model_url(model, "embedContent");
        let request = EmbedRequest {
            model: format!("models/{}", model),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        self.retry
            .run("Gemini embedding", || async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Gemini request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Gemini embedding failed: {}",
                        Self::failure(response).await
                    )));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse Gemini embedding: {}", e))
                })?;

                if embed_response.embedding.values.is_empty() {
                    return Err(Error::embedding("Gemini returned an empty embedding"));
                }
                Ok(embed_response.embedding.values)
            })
            .await
    }
}

/// Gemini embedding provider
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Gemini generative model provider
pub struct GeminiLlm {
    client: Arc<GeminiClient>,
}

impl GeminiLlm {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn complete(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String> {
        self.client.generate(prompt, attachment).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.client.config.generation_model
    }
}
