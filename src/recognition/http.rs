//! HTTP adapter for the recognition service.

use super::{
    EXTRACTION_INSTRUCTIONS, OUTLINE_INSTRUCTIONS, OutlineEntry, RecognitionClient,
    RecognitionError,
};
use crate::config::get_config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Recognition client issuing JSON requests to a remote runtime.
pub struct HttpRecognitionClient {
    http: Client,
    base_url: String,
    extract_model: String,
    outline_model: String,
    embedding_model: String,
    embedding_dimension: usize,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OutlineResponse {
    entries: Vec<OutlineEntry>,
}

impl HttpRecognitionClient {
    /// Construct a client from explicit parameters.
    pub fn new(
        base_url: String,
        extract_model: String,
        outline_model: String,
        embedding_model: String,
        embedding_dimension: usize,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .user_agent("folioscan/0.1")
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for recognition");
        Self {
            http,
            base_url,
            extract_model,
            outline_model,
            embedding_model,
            embedding_dimension,
        }
    }

    /// Construct a client using configuration derived from the environment.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(
            config.recognition_url.clone(),
            config.recognition_model.clone(),
            config.outline_model().to_string(),
            config.embedding_model.clone(),
            config.embedding_dimension,
            Duration::from_secs(config.recognition_timeout_secs()),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, RecognitionError> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                RecognitionError::Unavailable(format!(
                    "failed to reach recognition service at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RecognitionError::Unavailable(format!(
                "recognition endpoint {endpoint} returned 404"
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Failed(format!(
                "recognition service returned {status}: {text}"
            )));
        }

        response.json().await.map_err(|error| {
            RecognitionError::InvalidResponse(format!(
                "failed to decode recognition response: {error}"
            ))
        })
    }
}

#[async_trait]
impl RecognitionClient for HttpRecognitionClient {
    async fn extract_text(
        &self,
        page: &[u8],
        content_type: &str,
    ) -> Result<String, RecognitionError> {
        let body = json!({
            "model": self.extract_model,
            "content_type": content_type,
            "data": hex::encode(page),
            "instructions": EXTRACTION_INSTRUCTIONS,
        });
        let payload: ExtractResponse = self.post_json("v1/recognize", body).await?;
        let text = payload.text.trim().to_string();
        if text.is_empty() {
            return Err(RecognitionError::EmptyExtraction);
        }
        Ok(text)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecognitionError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });
        let payload: EmbedResponse = self.post_json("v1/embeddings", body).await?;
        if payload.embedding.len() != self.embedding_dimension {
            return Err(RecognitionError::InvalidResponse(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.embedding_dimension,
                payload.embedding.len()
            )));
        }
        Ok(payload.embedding)
    }

    async fn generate_outline(&self, text: &str) -> Result<Vec<OutlineEntry>, RecognitionError> {
        let body = json!({
            "model": self.outline_model,
            "text": text,
            "instructions": OUTLINE_INSTRUCTIONS,
        });
        let payload: OutlineResponse = self.post_json("v1/outline", body).await?;
        if payload.entries.is_empty() {
            return Err(RecognitionError::InvalidResponse(
                "outline response contained no entries".into(),
            ));
        }
        for entry in &payload.entries {
            if entry.label.trim().is_empty() {
                return Err(RecognitionError::InvalidResponse(
                    "outline entry has an empty label".into(),
                ));
            }
            if entry.level == 0 {
                return Err(RecognitionError::InvalidResponse(format!(
                    "outline entry '{}' has a non-positive level",
                    entry.label
                )));
            }
        }
        Ok(payload.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> HttpRecognitionClient {
        HttpRecognitionClient::new(
            server.base_url(),
            "scan-reader".into(),
            "scan-outliner".into(),
            "scan-embedder".into(),
            3,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn extract_returns_trimmed_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/recognize")
                    .json_body_partial(json!({ "model": "scan-reader" }).to_string());
                then.status(200)
                    .json_body(json!({ "text": "  Chapter One\nBody  " }));
            })
            .await;

        let client = client_for(&server);
        let text = client
            .extract_text(b"page bytes", "image/png")
            .await
            .expect("text");

        mock.assert();
        assert_eq!(text, "Chapter One\nBody");
    }

    #[tokio::test]
    async fn extract_treats_empty_output_as_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/recognize");
                then.status(200).json_body(json!({ "text": "   " }));
            })
            .await;

        let client = client_for(&server);
        let error = client
            .extract_text(b"page", "image/png")
            .await
            .expect_err("empty text");
        assert!(matches!(error, RecognitionError::EmptyExtraction));
    }

    #[tokio::test]
    async fn embed_rejects_dimension_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .json_body(json!({ "embedding": [0.1, 0.2] }));
            })
            .await;

        let client = client_for(&server);
        let error = client.embed("query").await.expect_err("mismatch");
        assert!(matches!(error, RecognitionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn embed_returns_vector() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .json_body(json!({ "embedding": [0.1, 0.2, 0.3] }));
            })
            .await;

        let client = client_for(&server);
        let vector = client.embed("query").await.expect("vector");
        assert_eq!(vector.len(), 3);
    }

    #[tokio::test]
    async fn outline_validates_entries() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/outline");
                then.status(200).json_body(json!({
                    "entries": [
                        { "label": "Introduction", "level": 1, "target_page": 1 },
                        { "label": "", "level": 2, "target_page": 2 }
                    ]
                }));
            })
            .await;

        let client = client_for(&server);
        let error = client.generate_outline("text").await.expect_err("label");
        assert!(matches!(error, RecognitionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn outline_rejects_empty_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/outline");
                then.status(200).json_body(json!({ "entries": [] }));
            })
            .await;

        let client = client_for(&server);
        let error = client.generate_outline("text").await.expect_err("empty");
        assert!(matches!(error, RecognitionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/recognize");
                then.status(500).body("boom");
            })
            .await;

        let client = client_for(&server);
        let error = client
            .extract_text(b"page", "image/png")
            .await
            .expect_err("server error");
        assert!(matches!(error, RecognitionError::Failed(message) if message.contains("500")));
    }
}
