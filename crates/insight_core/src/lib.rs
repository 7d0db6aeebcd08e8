//! Topic insight library: an Ollama-backed analysis service.
//!
//! A topic goes in, a structured insight record comes out: summary, key
//! concepts and recommended sources. The [`gateway`] talks to Ollama,
//! the [`normalizer`] turns free-text model replies into the record
//! shape, and the [`service`] ties them together with validation,
//! caching and degradation policy.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod normalizer;
pub mod service;
pub mod types;

pub use cache::InsightCache;
pub use config::{CacheConfig, Config, OllamaConfig};
pub use error::InsightError;
pub use gateway::{AiProvider, FakeProvider, GatewayStatus, OllamaGateway};
pub use normalizer::normalize;
pub use service::InsightService;
pub use types::{InsightRequest, InsightResponse, Recommendation, SUPPORTED_LANGUAGES};
