//! Ollama responder
//!
//! Answers queries with a vision-capable model served by Ollama. The
//! retrieved pages are attached to a single user message as base64 images.

use crate::config::OllamaConfig;
use crate::error::{ChatterError, Result};
use crate::providers::{GeneratedResponse, ResponseGenerator, ResponseMetadata, RetrievedPage};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Request structure for Ollama's /api/chat endpoint
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

/// Ollama-backed [`ResponseGenerator`]
///
/// # Examples
///
/// ```no_run
/// use pdf_chatter::config::OllamaConfig;
/// use pdf_chatter::providers::{OllamaResponder, ResponseGenerator};
///
/// # async fn example() -> pdf_chatter::error::Result<()> {
/// let responder = OllamaResponder::new(OllamaConfig::default(), 3)?;
/// let answer = responder.generate_response(&[], "What is the summary?", "S1").await?;
/// println!("{}", answer.text);
/// # Ok(())
/// # }
/// ```
pub struct OllamaResponder {
    client: Client,
    config: OllamaConfig,
    max_images: usize,
}

impl OllamaResponder {
    /// Create a new Ollama responder
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig, max_images: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pdf-chatter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatterError::Generation(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama responder: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self {
            client,
            config,
            max_images,
        })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Collect up to `max_images` page images as base64 strings
    ///
    /// Pages without an inline image fall back to reading `image_path`;
    /// unreadable pages are skipped with a warning.
    fn collect_images(&self, pages: &[RetrievedPage]) -> Vec<String> {
        let mut images = Vec::new();
        for page in pages {
            if images.len() >= self.max_images {
                break;
            }
            if let Some(encoded) = &page.base64 {
                images.push(encoded.clone());
                continue;
            }
            let Some(path) = &page.image_path else {
                tracing::debug!(
                    "Page {} of document {} has no image, skipping",
                    page.page_num,
                    page.doc_id
                );
                continue;
            };
            match std::fs::read(path) {
                Ok(bytes) => images.push(STANDARD.encode(bytes)),
                Err(e) => tracing::warn!("Failed to read page image {}: {}", path.display(), e),
            }
        }
        images
    }
}

/// Build the user prompt sent alongside the page images
fn build_prompt(query: &str, page_count: usize) -> String {
    if page_count == 0 {
        format!(
            "No document pages matched this question. Say so if you cannot answer it.\n\nQuestion: {}",
            query
        )
    } else {
        format!(
            "Answer the question using only the {} attached document page(s).\n\nQuestion: {}",
            page_count, query
        )
    }
}

#[async_trait]
impl ResponseGenerator for OllamaResponder {
    async fn generate_response(
        &self,
        pages: &[RetrievedPage],
        query: &str,
        session_id: &str,
    ) -> Result<GeneratedResponse> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let images = self.collect_images(pages);
        let pages_used = images.len();

        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: build_prompt(query, pages_used),
                images,
            }],
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request for session {}: {} images",
            session_id,
            pages_used
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                ChatterError::Generation(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(ChatterError::Generation(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            ChatterError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: prompt_tokens={}, completion_tokens={}",
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        Ok(GeneratedResponse {
            text: ollama_response.message.content,
            metadata: ResponseMetadata {
                model: ollama_response
                    .model
                    .or_else(|| Some(self.config.model.clone())),
                prompt_tokens: ollama_response.prompt_eval_count,
                completion_tokens: ollama_response.eval_count,
                pages_used,
            },
        })
    }
}
