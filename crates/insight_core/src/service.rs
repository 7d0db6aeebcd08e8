//! Insight service.
//!
//! Orchestrates one analysis: validate the request, consult the cache,
//! run the conversation through the provider, normalize the reply, cache
//! the result. Two entry points with different failure policies:
//! [`InsightService::analyze`] surfaces availability failures as typed
//! errors, [`InsightService::analyze_or_fallback`] degrades to a
//! diagnostic record instead so the caller always gets a fully shaped
//! answer.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::InsightCache;
use crate::config::Config;
use crate::error::InsightError;
use crate::gateway::{AiProvider, OllamaGateway};
use crate::normalizer::normalize;
use crate::types::{InsightRequest, InsightResponse, Recommendation};

pub struct InsightService {
    provider: Arc<dyn AiProvider>,
    cache: InsightCache,
}

impl InsightService {
    /// Build a service backed by a live Ollama gateway.
    pub fn new(config: &Config) -> Self {
        Self::with_provider(Arc::new(OllamaGateway::new(config.ollama.clone())), config)
    }

    /// Build a service over an arbitrary provider. Used by tests and by
    /// callers that supply their own backend.
    pub fn with_provider(provider: Arc<dyn AiProvider>, config: &Config) -> Self {
        Self {
            provider,
            cache: InsightCache::new(&config.cache),
        }
    }

    pub fn provider(&self) -> &Arc<dyn AiProvider> {
        &self.provider
    }

    pub fn cache(&self) -> &InsightCache {
        &self.cache
    }

    /// Analyze a topic. Availability failures surface as errors; a reply
    /// that arrives, however malformed, never fails - it degrades to
    /// placeholder content.
    pub async fn analyze(&self, request: &InsightRequest) -> Result<InsightResponse, InsightError> {
        request.validate()?;
        let key = request.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let raw = match self
            .provider
            .converse(request.topic.trim(), request.language_hint())
            .await
        {
            Ok(raw) => {
                info!(topic = %request.topic, chars = raw.len(), "model reply received");
                raw
            }
            // A reply arrived but carried nothing usable. Same treatment as
            // an absent reply: full placeholder synthesis, never an error.
            Err(InsightError::MalformedReply(reason)) => {
                warn!(topic = %request.topic, %reason, "unusable model reply, synthesizing placeholders");
                return Ok(normalize(request.topic.trim(), None));
            }
            Err(e) => return Err(e),
        };

        let response = normalize(request.topic.trim(), Some(&raw));
        self.cache.put(key, response.clone());
        Ok(response)
    }

    /// Analyze a topic, degrading to a diagnostic record when the model
    /// backend is unavailable. Validation failures still surface as
    /// errors; degraded records are never cached.
    pub async fn analyze_or_fallback(
        &self,
        request: &InsightRequest,
    ) -> Result<InsightResponse, InsightError> {
        match self.analyze(request).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_unavailable() => {
                warn!(topic = %request.topic, error = %e, "backend unavailable, returning fallback");
                Ok(Self::fallback_response(request.topic.trim()))
            }
            Err(e) => Err(e),
        }
    }

    /// Diagnostic record returned when Ollama cannot be reached. Shaped
    /// like a normal answer so downstream consumers need no special case.
    fn fallback_response(topic: &str) -> InsightResponse {
        InsightResponse {
            topic: topic.to_string(),
            summary: format!(
                "Не удалось получить анализ темы '{topic}' от локальной модели Ollama."
            ),
            key_concepts: vec![
                "Попробуйте перезапустить запрос".to_string(),
                "Убедитесь, что Ollama запущена локально".to_string(),
                "Проверьте настройки подключения".to_string(),
            ],
            recommendations: vec![
                Recommendation::new("Документация Ollama", "https://ollama.ai/docs"),
                Recommendation::new("Руководство по запуску", "https://ollama.ai/getting-started"),
            ],
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeProvider;

    const REPLY: &str = "РЕЗЮМЕ:\nSpring Boot - фреймворк.\n\nКЛЮЧЕВЫЕ КОНЦЕПЦИИ:\n- Автоконфигурация\n- Встроенный сервер\n\nРЕКОМЕНДУЕМЫЕ ИСТОЧНИКИ:\n- Документация: https://spring.io";

    fn service(provider: FakeProvider) -> (InsightService, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let service = InsightService::with_provider(provider.clone(), &Config::default());
        (service, provider)
    }

    #[tokio::test]
    async fn test_analyze_parses_model_reply() {
        let (service, _) = service(FakeProvider::replying(REPLY));
        let response = service
            .analyze(&InsightRequest::new("Spring Boot"))
            .await
            .unwrap();
        assert_eq!(response.topic, "Spring Boot");
        assert_eq!(
            response.key_concepts,
            vec!["Автоконфигурация", "Встроенный сервер"]
        );
        assert_eq!(response.recommendations[0].url, "https://spring.io");
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_request_before_provider() {
        let (service, provider) = service(FakeProvider::replying(REPLY));
        let err = service.analyze(&InsightRequest::new("")).await.unwrap_err();
        assert!(matches!(err, InsightError::Validation(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_analyze_hits_cache() {
        let (service, provider) = service(FakeProvider::replying(REPLY));
        let request = InsightRequest::new("Spring Boot").with_language("ru");
        service.analyze(&request).await.unwrap();
        service.analyze(&request).await.unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_language_is_part_of_cache_key() {
        let (service, provider) = service(FakeProvider::replying(REPLY));
        service
            .analyze(&InsightRequest::new("Spring Boot").with_language("ru"))
            .await
            .unwrap();
        service
            .analyze(&InsightRequest::new("Spring Boot").with_language("en"))
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_analyze_surfaces_unavailability() {
        let (service, _) = service(FakeProvider::failing(InsightError::ServiceUnavailable(
            "http://localhost:11434".into(),
        )));
        let err = service
            .analyze(&InsightRequest::new("Spring Boot"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_fallback_record_when_backend_down() {
        let (service, _) = service(FakeProvider::failing(InsightError::ModelMissing(
            "llama2".into(),
        )));
        let response = service
            .analyze_or_fallback(&InsightRequest::new("Spring Boot"))
            .await
            .unwrap();
        assert!(response.summary.contains("Не удалось получить анализ"));
        assert_eq!(response.key_concepts.len(), 3);
        assert_eq!(response.recommendations[0].url, "https://ollama.ai/docs");
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let (service, _) = service(FakeProvider::failing(InsightError::ServiceUnavailable(
            "http://localhost:11434".into(),
        )));
        service
            .analyze_or_fallback(&InsightRequest::new("Spring Boot"))
            .await
            .unwrap();
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_still_rejects_invalid_request() {
        let (service, _) = service(FakeProvider::replying(REPLY));
        let err = service
            .analyze_or_fallback(&InsightRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_reply_degrades_to_placeholders() {
        let (service, _) = service(FakeProvider::failing(InsightError::MalformedReply(
            "no content".into(),
        )));
        let response = service
            .analyze(&InsightRequest::new("Kafka"))
            .await
            .unwrap();
        assert_eq!(response.summary, "Анализ темы: Kafka");
        // Synthesized records are not cached.
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_unstructured_reply_degrades_not_fails() {
        let (service, _) = service(FakeProvider::replying("просто текст"));
        let response = service
            .analyze(&InsightRequest::new("Kafka"))
            .await
            .unwrap();
        assert_eq!(response.summary, "просто текст");
        assert!(!response.key_concepts.is_empty());
        assert!(!response.recommendations.is_empty());
    }
}
