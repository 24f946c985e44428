use async_trait::async_trait;
use serde_json::json;

use stepflow_core::config::ImageApiConfig;
use stepflow_core::error::ToolError;
use stepflow_core::executor::ImageTool;

use super::http::{auth, build_client, endpoint, send_bytes};

/// Image collaborator for hosted text-to-image inference endpoints that take
/// `{"inputs": prompt}` and answer with raw image bytes.
pub struct ImageApiTool {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl ImageApiTool {
    pub fn new(cfg: &ImageApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_client(cfg.timeout_ms)?,
            api_key: cfg.api_key.clone(),
            url: endpoint(&cfg.base_url, ""),
        })
    }
}

pub fn banner_prompt(topic: &str) -> String {
    format!(
        "Professional, modern banner image about: {topic}. \
         Clean design with abstract visuals, corporate color palette (blues, whites, grays). \
         No text, no words, no letters in the image."
    )
}

#[async_trait]
impl ImageTool for ImageApiTool {
    fn name(&self) -> &str {
        "image_api"
    }

    async fn generate(&self, topic: &str) -> Result<Vec<u8>, ToolError> {
        tracing::debug!(url = %self.url, "image request");
        let req = self
            .http
            .post(&self.url)
            .json(&json!({ "inputs": banner_prompt(topic) }));
        let bytes = send_bytes(auth(req, &self.api_key), &self.url).await?;
        if bytes.is_empty() {
            return Err(ToolError::Decode("image response body is empty".to_string()));
        }
        tracing::debug!(bytes = bytes.len(), "image response");
        Ok(bytes)
    }
}
