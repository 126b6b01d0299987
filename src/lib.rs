pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod llm_providers;
pub mod logging;
pub mod models;
pub mod quiz_generator;
pub mod quiz_service;

pub use config::Config;
pub use database::QuizStore;
pub use errors::*;
pub use fetcher::{RetryPolicy, WikipediaFetcher};
pub use llm_providers::{JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType};
pub use models::*;
pub use quiz_generator::{GeneratorBackend, QuizGenerator};
pub use quiz_service::QuizService;
