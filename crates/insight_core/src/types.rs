//! Request and response records for topic analysis.
//!
//! `InsightResponse` is the caller-facing contract: every field is always
//! populated, whatever the upstream model produced. Field names serialize
//! camelCase to keep the original JSON wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InsightError;

/// Languages accepted in `InsightRequest::language`.
pub const SUPPORTED_LANGUAGES: [&str; 5] = ["ru", "en", "es", "fr", "de"];

/// Maximum topic length in characters.
pub const TOPIC_MAX_CHARS: usize = 200;

/// Minimum topic length in characters.
pub const TOPIC_MIN_CHARS: usize = 2;

/// Maximum length of the optional free-text field.
pub const TEXT_MAX_CHARS: usize = 5000;

/// A topic analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    /// Topic to analyze. Required, 2-200 characters.
    pub topic: String,
    /// Optional supporting text, up to 5000 characters. Accepted and
    /// validated but not consumed by the current parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Requested number of results, 1-50. Unused by the current logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Answer language: one of ru, en, es, fr, de, or absent/empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl InsightRequest {
    /// Create a request for a topic with everything else unset.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            text: None,
            max_results: None,
            language: None,
        }
    }

    /// Set the answer language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The language hint to forward to the model, if one was given.
    pub fn language_hint(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }

    /// Cache key: topic plus language, matching the original
    /// `topic + '_' + language` scheme.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.topic, self.language.as_deref().unwrap_or(""))
    }

    /// Validate the request. Runs before any external call.
    pub fn validate(&self) -> Result<(), InsightError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(InsightError::Validation("topic must not be empty".into()));
        }
        let len = topic.chars().count();
        if !(TOPIC_MIN_CHARS..=TOPIC_MAX_CHARS).contains(&len) {
            return Err(InsightError::Validation(format!(
                "topic must be {TOPIC_MIN_CHARS}-{TOPIC_MAX_CHARS} characters, got {len}"
            )));
        }
        if let Some(text) = &self.text {
            if text.chars().count() > TEXT_MAX_CHARS {
                return Err(InsightError::Validation(format!(
                    "text must not exceed {TEXT_MAX_CHARS} characters"
                )));
            }
        }
        if let Some(n) = self.max_results {
            if !(1..=50).contains(&n) {
                return Err(InsightError::Validation(
                    "maxResults must be between 1 and 50".into(),
                ));
            }
        }
        if let Some(lang) = &self.language {
            if !lang.is_empty() && !SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
                return Err(InsightError::Validation(format!(
                    "unsupported language '{lang}', expected one of: {}",
                    SUPPORTED_LANGUAGES.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// One recommended source: a title and where to find it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub url: String,
}

impl Recommendation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// The structured insight record produced for a topic.
///
/// Invariant: never partially filled. Summary is non-empty and both lists
/// hold at least one entry; sections that could not be extracted carry
/// deterministic topic-parameterized placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub topic: String,
    pub summary: String,
    pub key_concepts: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub timestamp: DateTime<Utc>,
}
