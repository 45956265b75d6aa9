//! OpenAI-compatible embedding client.
//!
//! Implements [`Embedder`] by sending the whole batch to
//! `POST {api_base}/embeddings` in one request. There is no retry: a
//! transport failure, non-success status, or malformed payload surfaces as
//! an [`EmbeddingError`] and the caller decides what to do with it.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use tutorbot_core::embedding::{Embedder, EmbeddingError};

use crate::config::{EmbeddingConfig, ProviderConfig};

/// Embedding provider using the OpenAI embeddings API (or any server that
/// speaks the same wire format).
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAIEmbedder {
    pub fn new(
        provider: &ProviderConfig,
        config: &EmbeddingConfig,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", provider.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, inputs = texts.len(), "Sending embedding request");

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        let vectors = parse_embedding_response(&json)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

/// Extract `data[].embedding` arrays, ordered by `data[].index` when the
/// provider supplies it.
///
/// Indices must form a permutation of `0..data.len()`, and every value must
/// be a finite `f32`; anything else is an [`EmbeddingError::InvalidResponse`].
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmbeddingError::InvalidResponse("missing data array".to_string()))?;

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];
    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbeddingError::InvalidResponse("missing embedding".to_string()))?;

        let vector = embedding
            .iter()
            .map(|v| {
                let f = v.as_f64().ok_or_else(|| {
                    EmbeddingError::InvalidResponse("non-numeric embedding value".to_string())
                })? as f32;
                if !f.is_finite() {
                    return Err(EmbeddingError::InvalidResponse(format!(
                        "embedding value {} is out of range",
                        v
                    )));
                }
                Ok(f)
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let slot = slots.get_mut(index).ok_or_else(|| {
            EmbeddingError::InvalidResponse(format!(
                "index {} out of range for {} embeddings",
                index,
                data.len()
            ))
        })?;
        if slot.is_some() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "duplicate index {}",
                index
            )));
        }
        *slot = Some(vector);
    }

    // n items into n distinct in-range slots leaves none empty
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_in_order() {
        let json = json!({
            "data": [
                {"index": 0, "embedding": [0.1, 0.2]},
                {"index": 1, "embedding": [0.3, 0.4]}
            ]
        });
        let vecs = parse_embedding_response(&json).unwrap();
        assert_eq!(vecs, vec![vec![0.1f32, 0.2], vec![0.3f32, 0.4]]);
    }

    #[test]
    fn test_parse_restores_index_order() {
        let json = json!({
            "data": [
                {"index": 1, "embedding": [1.0]},
                {"index": 0, "embedding": [0.0]}
            ]
        });
        let vecs = parse_embedding_response(&json).unwrap();
        assert_eq!(vecs, vec![vec![0.0f32], vec![1.0f32]]);
    }

    #[test]
    fn test_parse_without_index_keeps_position() {
        let json = json!({"data": [{"embedding": [2.0]}, {"embedding": [3.0]}]});
        let vecs = parse_embedding_response(&json).unwrap();
        assert_eq!(vecs, vec![vec![2.0f32], vec![3.0f32]]);
    }

    #[test]
    fn test_parse_missing_data() {
        let err = parse_embedding_response(&json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_non_numeric_value() {
        let json = json!({"data": [{"embedding": [1.0, "x"]}]});
        assert!(parse_embedding_response(&json).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_value() {
        let json = json!({"data": [{"index": 0, "embedding": [0.5, 1e300]}]});
        let err = parse_embedding_response(&json).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_rejects_duplicate_index() {
        let json = json!({
            "data": [
                {"index": 1, "embedding": [1.0]},
                {"index": 1, "embedding": [2.0]}
            ]
        });
        let err = parse_embedding_response(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate index 1"));
    }

    #[test]
    fn test_parse_rejects_index_out_of_range() {
        let json = json!({
            "data": [
                {"index": 0, "embedding": [1.0]},
                {"index": 2, "embedding": [2.0]}
            ]
        });
        let err = parse_embedding_response(&json).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
        assert!(err.to_string().contains("index 2 out of range"));
    }

    #[test]
    fn test_url_joins_api_base() {
        let provider = ProviderConfig {
            api_base: "http://localhost:9999/v1/".to_string(),
            ..ProviderConfig::default()
        };
        let embedder = OpenAIEmbedder::new(&provider, &EmbeddingConfig::default(), "k").unwrap();
        assert_eq!(embedder.url, "http://localhost:9999/v1/embeddings");
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
