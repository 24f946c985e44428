use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stepflow_core::config::ChatToolConfig;
use stepflow_core::error::ToolError;
use stepflow_core::executor::{TextTool, ToolKind, ToolRequest};

use super::http::{auth, build_client, endpoint, send_json};

const SUMMARIZE_PROMPT: &str = "Summarize the following content into concise bullet points \
capturing the key insights, trends, and facts. Keep only the most relevant information.";

const GENERATE_PROMPT: &str = "You are an expert content writer. Write an engaging post based \
on the research provided.\n\nFormat:\n\
1. Start with a compelling one-line hook\n\
2. Body: 150-250 words, conversational yet professional tone\n\
3. Use short paragraphs (2-3 sentences max)\n\
4. End with a call-to-action or thought-provoking question\n\
5. Finish with 3-5 relevant hashtags on a new line\n\n\
Do NOT use markdown formatting. Write plain text.";

const EDIT_PROMPT: &str = "You are a senior content editor. Polish the following draft for \
clarity, tone and structure. Keep paragraphs short, keep a clear call-to-action and relevant \
hashtags, and remove jargon that adds nothing.\n\n\
Return ONLY the final polished post, no explanations or meta-commentary.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Text collaborator backed by an OpenAI-compatible `/chat/completions` API.
///
/// One instance serves one tool kind; the kind picks the role prompt.
pub struct ChatTool {
    kind: ToolKind,
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    url_chat: String,
}

impl ChatTool {
    pub fn new(kind: ToolKind, cfg: &ChatToolConfig) -> anyhow::Result<Self> {
        if system_prompt(&kind).is_none() {
            anyhow::bail!("chat backend cannot serve tool kind '{kind}'");
        }
        Ok(Self {
            temperature: cfg.temperature.unwrap_or_else(|| default_temperature(&kind)),
            kind,
            http: build_client(cfg.timeout_ms)?,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            url_chat: endpoint(&cfg.base_url, "chat/completions"),
        })
    }

    fn messages(&self, request: &ToolRequest) -> Vec<ChatMessage<'static>> {
        let user = match self.kind {
            ToolKind::Generate => format!(
                "Topic: {}\n\nResearch:\n{}",
                request.topic, request.input
            ),
            _ => request.input.clone(),
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt(&self.kind) {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });
        messages
    }
}

fn system_prompt(kind: &ToolKind) -> Option<&'static str> {
    match kind {
        ToolKind::Summarize => Some(SUMMARIZE_PROMPT),
        ToolKind::Generate => Some(GENERATE_PROMPT),
        ToolKind::Edit => Some(EDIT_PROMPT),
        _ => None,
    }
}

fn default_temperature(kind: &ToolKind) -> f32 {
    match kind {
        ToolKind::Generate => 0.7,
        _ => 0.3,
    }
}

#[async_trait]
impl TextTool for ChatTool {
    fn name(&self) -> &str {
        "chat"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        let url = &self.url_chat;
        tracing::debug!(
            url = %url,
            model = %self.model,
            tool_kind = %self.kind,
            input_len = request.input.len(),
            "chat request"
        );

        let payload = ChatPayload {
            model: &self.model,
            temperature: self.temperature,
            messages: self.messages(request),
        };
        let req = self.http.post(url).json(&payload);
        let resp: ChatResponse = send_json(auth(req, &self.api_key), url).await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ToolError::Decode("chat response has no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(base_url: String) -> ChatToolConfig {
        ChatToolConfig {
            base_url,
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            temperature: None,
            timeout_ms: 5_000,
        }
    }

    #[test]
    fn test_chat_rejects_non_text_kinds() {
        let cfg = config("http://localhost".to_string());
        assert!(ChatTool::new(ToolKind::Image, &cfg).is_err());
        assert!(ChatTool::new(ToolKind::Search, &cfg).is_err());
        assert!(ChatTool::new(ToolKind::Edit, &cfg).is_ok());
    }

    #[tokio::test]
    async fn test_generate_sends_topic_and_research() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({
                    "model": "test-model",
                    "temperature": 0.7
                })),
                Matcher::Regex("Topic: rust\\\\n\\\\nResearch:\\\\nfacts".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "a post"}}]}"#)
            .create_async()
            .await;

        let tool = ChatTool::new(ToolKind::Generate, &config(server.url())).unwrap();
        let out = tool
            .invoke(&ToolRequest {
                kind: ToolKind::Generate,
                topic: "rust".to_string(),
                input: "facts".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, "a post");
    }

    #[tokio::test]
    async fn test_empty_choices_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let tool = ChatTool::new(ToolKind::Summarize, &config(server.url())).unwrap();
        let err = tool
            .invoke(&ToolRequest {
                kind: ToolKind::Summarize,
                topic: "t".to_string(),
                input: "text".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Decode(_)));
    }
}
