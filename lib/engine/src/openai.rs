//! Collaborators backed by an OpenAI-compatible HTTP API.
//!
//! Both clients are blocking and make exactly one request per call; retries
//! are left to the caller.

use crate::collaborators::{Embedder, Justifier};
use lookbook_core::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const JUSTIFY_SYSTEM_PROMPT: &str = "You are a fashion stylist. In one short sentence, explain \
why the item fits the customer's style, occasion and the outfit chosen so far. Mention a \
concrete color, texture or fit from the item description.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {}", e)))
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        client: &reqwest::blocking::Client,
        path: &str,
        body: &B,
    ) -> std::result::Result<R, String> {
        let mut request = client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, text));
        }
        response.json::<R>().map_err(|e| e.to_string())
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = config.client()?;
        Ok(Self { config, client })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vector> {
        let response: EmbedResponse = self
            .config
            .post(
                &self.client,
                "embeddings",
                &EmbedRequest {
                    model: &self.config.model,
                    input: text,
                },
            )
            .map_err(Error::Embedding)?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Embedding("response contained no embedding".to_string()))?;
        debug!(dim = embedding.len(), "embedding received");
        Ok(Vector::new(embedding))
    }

    fn model_id(&self) -> String {
        format!("openai/{}", self.config.model)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiJustifier {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiJustifier {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = config.client()?;
        Ok(Self { config, client })
    }
}

impl Justifier for OpenAiJustifier {
    fn justify(&self, description: &str, context: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JUSTIFY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Customer context: {}\nItem: {}", context, description),
                },
            ],
        };

        let response: ChatResponse = self
            .config
            .post(&self.client, "chat/completions", &request)
            .map_err(|message| Error::Collaborator {
                collaborator: "justifier",
                message,
            })?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default())
    }
}
