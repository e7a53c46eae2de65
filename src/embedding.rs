//! Embedding provider abstraction and implementations.
//!
//! Defines the [`Embedder`] trait plus the two remote backends:
//! - **[`OpenAiEmbedder`]** — the OpenAI embeddings API.
//! - **[`AzureOpenAiEmbedder`]** — an Azure OpenAI embeddings deployment.
//!
//! Both backends send **one input per request**: the Azure embeddings
//! backend rejects larger batches, so the batch limit is enforced here
//! rather than left to callers.
//!
//! Also provides the vector utilities shared by the index:
//! [`cosine_similarity`], [`vec_to_blob`], [`blob_to_vec`].
//!
//! # Retry Strategy
//!
//! Transient errors retry with exponential backoff (1s, 2s, 4s, ...,
//! capped at 32s): HTTP 429, HTTP 5xx, and network errors retry; any
//! other 4xx fails immediately.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Azure OpenAI REST API version used for embeddings and chat.
pub(crate) const AZURE_API_VERSION: &str = "2024-02-01";

/// An embedding backend: text in, fixed-dimension vectors out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model or deployment identifier, for reporting.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

/// Instantiate the embedder named by the configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        "azure" => Ok(Box::new(AzureOpenAiEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ OpenAI ============

/// Embedding backend for `POST https://api.openai.com/v1/embeddings`.
/// Requires `OPENAI_API_KEY` in the environment.
pub struct OpenAiEmbedder {
    model: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let mut vectors = Vec::with_capacity(texts.len());

        // One input per call; see module docs
        for text in texts {
            let body = serde_json::json!({
                "model": self.model,
                "input": [text],
            });
            let json = post_json_with_retry(
                &client,
                "https://api.openai.com/v1/embeddings",
                ("Authorization", format!("Bearer {}", self.api_key)),
                &body,
                self.max_retries,
            )
            .await?;
            vectors.push(parse_embedding_response(&json)?);
        }

        Ok(vectors)
    }
}

// ============ Azure OpenAI ============

/// Embedding backend for an Azure OpenAI deployment. Requires
/// `AZURE_OPENAI_API_KEY` and `AZURE_OPENAI_ENDPOINT` in the environment.
pub struct AzureOpenAiEmbedder {
    deployment: String,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl AzureOpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let deployment = config
            .deployment
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.deployment required for Azure provider"))?;
        let (endpoint, api_key) = azure_credentials()?;

        Ok(Self {
            deployment,
            endpoint,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.deployment
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let url = format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            AZURE_API_VERSION
        );

        let mut vectors = Vec::with_capacity(texts.len());

        // One input per call; the Azure backend rejects larger batches
        for text in texts {
            let body = serde_json::json!({ "input": [text] });
            let json = post_json_with_retry(
                &client,
                &url,
                ("api-key", self.api_key.clone()),
                &body,
                self.max_retries,
            )
            .await?;
            vectors.push(parse_embedding_response(&json)?);
        }

        Ok(vectors)
    }
}

/// Read the Azure endpoint and key from the environment.
pub(crate) fn azure_credentials() -> Result<(String, String)> {
    let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT")
        .map_err(|_| anyhow::anyhow!("AZURE_OPENAI_ENDPOINT environment variable not set"))?;
    let api_key = std::env::var("AZURE_OPENAI_API_KEY")
        .map_err(|_| anyhow::anyhow!("AZURE_OPENAI_API_KEY environment variable not set"))?;
    Ok((endpoint, api_key))
}

// ============ Shared HTTP plumbing ============

/// POST a JSON body, retrying 429/5xx/network errors with exponential
/// backoff. Non-429 client errors fail immediately.
pub(crate) async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    auth_header: (&str, String),
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(url)
            .header(auth_header.0, &auth_header.1)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("API error {}: {}", status, body_text));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
}

/// Extract the single embedding vector from a `data[0].embedding` reply.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data[0].embedding"))?;

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

// ============ Vector utilities ============

/// Encode a float vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for empty or mismatched
/// vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(blob_to_vec(&blob), vec);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_parse_embedding_response() {
        let json = serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
            "model": "text-embedding-ada-002"
        });
        let vec = parse_embedding_response(&json).unwrap();
        assert_eq!(vec.len(), 3);
        assert!((vec[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_embedding_response_missing_data() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(parse_embedding_response(&json).is_err());
    }
}
