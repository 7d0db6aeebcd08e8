//! Ollama gateway.
//!
//! Talks to a locally running Ollama instance over its HTTP API. The
//! gateway tracks two independent availability flags: whether the host
//! answers at all, and whether the configured model is present in its
//! model list. Both are refreshed by [`OllamaGateway::probe`] and kept
//! in atomics so status queries never block on the network.
//!
//! Conversations either return real model text or a typed error. The
//! gateway never fabricates reply content; degraded answers are the
//! service layer's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::OllamaConfig;
use crate::error::InsightError;

/// Instruction prompt sent as the system message of every conversation.
/// Pins the reply to the sectioned format the normalizer expects.
const SYSTEM_PROMPT: &str = "Вы - помощник, который предоставляет информацию и анализ по различным темам. Предоставьте краткое резюме, ключевые концепции и рекомендации для дальнейшего чтения по запрашиваемой теме. Структурируйте ответ в следующем формате:\n\nРЕЗЮМЕ:\n[краткое описание темы]\n\nКЛЮЧЕВЫЕ КОНЦЕПЦИИ:\n- [концепция 1]\n- [концепция 2]\n- [концепция 3]\n\nРЕКОМЕНДУЕМЫЕ ИСТОЧНИКИ:\n- [название источника 1]: [URL если есть]\n- [название источника 2]: [URL если есть]";

/// Abstraction over the model backend so the service layer can be tested
/// without a live Ollama.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Run one analysis conversation and return the raw reply text.
    async fn converse(&self, topic: &str, language: Option<&str>) -> Result<String, InsightError>;

    /// Probe the backend and refresh availability state. Returns whether
    /// both the host and the model are usable.
    async fn check_availability(&self) -> bool;

    /// Last known availability, without touching the network.
    fn is_available(&self) -> bool;

    /// Human-readable backend identifier for status output.
    fn provider_name(&self) -> String;
}

/// Snapshot of gateway availability for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub service_available: bool,
    pub model_available: bool,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// HTTP client for the Ollama chat and tags endpoints.
pub struct OllamaGateway {
    config: OllamaConfig,
    client: reqwest::Client,
    service_available: AtomicBool,
    model_available: AtomicBool,
}

impl OllamaGateway {
    pub fn new(config: OllamaConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            config,
            client,
            service_available: AtomicBool::new(false),
            model_available: AtomicBool::new(false),
        }
    }

    /// Current availability snapshot.
    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            service_available: self.service_available.load(Ordering::SeqCst),
            model_available: self.model_available.load(Ordering::SeqCst),
            base_url: self.config.base_url.clone(),
            model: self.config.model.clone(),
        }
    }

    /// Whether the configured model name appears in a tags listing.
    /// Exact match: "llama2" does not satisfy a host that only has
    /// "llama2:13b".
    fn model_listed(&self, tags: &TagsResponse) -> bool {
        tags.models.iter().any(|tag| tag.name == self.config.model)
    }

    fn apply_probe_result(&self, service: bool, model: bool) {
        self.service_available.store(service, Ordering::SeqCst);
        self.model_available.store(model, Ordering::SeqCst);
    }

    /// Probe the host's model list and refresh both availability flags.
    pub async fn probe(&self) -> bool {
        let url = self.config.tags_url();
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<TagsResponse>().await {
                Ok(tags) => {
                    let model = self.model_listed(&tags);
                    self.apply_probe_result(true, model);
                    if model {
                        debug!(model = %self.config.model, "Ollama probe ok");
                    } else {
                        warn!(
                            model = %self.config.model,
                            available = ?tags.models.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                            "Ollama reachable but model not installed"
                        );
                    }
                    model
                }
                Err(e) => {
                    warn!("Ollama tags reply not decodable: {}", e);
                    self.apply_probe_result(true, false);
                    false
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "Ollama tags probe failed");
                self.apply_probe_result(false, false);
                false
            }
            Err(e) => {
                debug!("Ollama not reachable at {}: {}", url, e);
                self.apply_probe_result(false, false);
                false
            }
        }
    }

    fn user_prompt(topic: &str, language: Option<&str>) -> String {
        match language {
            Some(lang) => format!("Тема для анализа: {topic}. Язык ответа: {lang}"),
            None => format!("Тема для анализа: {topic}"),
        }
    }

    async fn send_chat(&self, topic: &str, language: Option<&str>) -> Result<String, InsightError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(topic, language),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(self.config.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    self.service_available.store(false, Ordering::SeqCst);
                    InsightError::ServiceUnavailable(self.config.base_url.clone())
                } else {
                    InsightError::MalformedReply(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::RemoteError {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsightError::MalformedReply(e.to_string()))?;

        match reply.message {
            Some(message) if !message.content.trim().is_empty() => Ok(message.content),
            _ => Err(InsightError::MalformedReply(
                "chat reply carried no message content".to_string(),
            )),
        }
    }

    #[cfg(test)]
    fn set_availability(&self, service: bool, model: bool) {
        self.apply_probe_result(service, model);
    }
}

#[async_trait]
impl AiProvider for OllamaGateway {
    async fn converse(&self, topic: &str, language: Option<&str>) -> Result<String, InsightError> {
        if self.config.healthcheck_enabled {
            if !self.service_available.load(Ordering::SeqCst) {
                // One fresh probe before giving up: the host may have come
                // up since the last check.
                info!("Ollama marked unavailable, re-probing before chat");
                self.probe().await;
            }
            if !self.service_available.load(Ordering::SeqCst) {
                return Err(InsightError::ServiceUnavailable(
                    self.config.base_url.clone(),
                ));
            }
            if !self.model_available.load(Ordering::SeqCst) {
                return Err(InsightError::ModelMissing(self.config.model.clone()));
            }
        }
        self.send_chat(topic, language).await
    }

    async fn check_availability(&self) -> bool {
        self.probe().await
    }

    fn is_available(&self) -> bool {
        self.service_available.load(Ordering::SeqCst)
            && self.model_available.load(Ordering::SeqCst)
    }

    fn provider_name(&self) -> String {
        format!("ollama ({} @ {})", self.config.model, self.config.base_url)
    }
}

/// Scripted provider for tests. Returns a fixed reply or a fixed error
/// and counts conversations.
pub struct FakeProvider {
    reply: Result<String, InsightError>,
    available: bool,
    pub call_count: std::sync::atomic::AtomicUsize,
}

impl FakeProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            available: true,
            call_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(error: InsightError) -> Self {
        Self {
            reply: Err(error),
            available: false,
            call_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    async fn converse(&self, _topic: &str, _language: Option<&str>) -> Result<String, InsightError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    async fn check_availability(&self) -> bool {
        self.available
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn provider_name(&self) -> String {
        "fake".to_string()
    }
}
