#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiki_quiz::config::{LLMConfig, WikipediaConfig};
use wiki_quiz::{
    LLMProviderType, QuizGenerator, QuizService, QuizStore, RetryPolicy, WikipediaFetcher,
};

pub const ARTICLE_URL: &str = "https://en.wikipedia.org/wiki/Alan_Turing";

pub const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Alan Turing - Wikipedia</title><script>var wg = {};</script></head>
<body>
<div id="mw-content-text"><div class="mw-parser-output">
<table class="infobox"><tr><td><p>Born 23 June 1912</p></td></tr></table>
<p>Alan Turing was an English mathematician and computer scientist.<sup class="reference">[1]</sup></p>
<p>During the Second World War he worked at <b>Bletchley Park</b>.
He devised techniques for breaking German ciphers.</p>
<h2>Legacy<span class="mw-editsection">[edit]</span></h2>
<p>The Turing Award is named after him.</p>
</div></div>
</body></html>"#;

pub const SUMMARY_EXTRACT: &str = "Alan Mathison Turing was a pioneer of theoretical computer science.";

/// How the fake Wikipedia answers
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageMode {
    Ok,
    /// Responds after the fetch timeout has elapsed
    Hang,
    NotFound,
    Empty,
}

#[derive(Clone)]
pub struct FakeWikipedia {
    pub page_mode: PageMode,
    pub summary_ok: bool,
    pub page_hits: Arc<AtomicUsize>,
    pub summary_hits: Arc<AtomicUsize>,
}

impl FakeWikipedia {
    pub fn new(page_mode: PageMode, summary_ok: bool) -> Self {
        Self {
            page_mode,
            summary_ok,
            page_hits: Arc::new(AtomicUsize::new(0)),
            summary_hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn page_hits(&self) -> usize {
        self.page_hits.load(Ordering::SeqCst)
    }

    pub fn summary_hits(&self) -> usize {
        self.summary_hits.load(Ordering::SeqCst)
    }
}

async fn summary_handler(State(wiki): State<FakeWikipedia>) -> Response {
    wiki.summary_hits.fetch_add(1, Ordering::SeqCst);
    if wiki.summary_ok {
        Json(json!({
            "title": "Alan Turing",
            "extract": SUMMARY_EXTRACT,
        }))
        .into_response()
    } else {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}

async fn page_handler(State(wiki): State<FakeWikipedia>) -> Response {
    wiki.page_hits.fetch_add(1, Ordering::SeqCst);
    match wiki.page_mode {
        PageMode::Ok => Html(ARTICLE_HTML).into_response(),
        PageMode::Hang => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Html(ARTICLE_HTML).into_response()
        }
        PageMode::NotFound => StatusCode::NOT_FOUND.into_response(),
        PageMode::Empty => {
            Html("<html><body><div id=\"mw-content-text\"><table><tr><td>x</td></tr></table></div></body></html>")
                .into_response()
        }
    }
}

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_wikipedia(wiki: FakeWikipedia) -> String {
    let app = Router::new()
        .route("/api/rest_v1/page/summary/:slug", get(summary_handler))
        .route("/wiki/:slug", get(page_handler))
        .with_state(wiki);
    spawn_server(app).await
}

/// OpenAI-compatible endpoint that always answers with `reply` as the assistant message
pub async fn spawn_llm_backend(reply: String) -> String {
    let app = Router::new().route(
        "/chat/completions",
        post(move || {
            let reply = reply.clone();
            async move {
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": reply}}]
                }))
            }
        }),
    );
    spawn_server(app).await
}

/// OpenAI-compatible endpoint that fails every request with a 500
pub async fn spawn_failing_llm_backend() -> String {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend unavailable") }),
    );
    spawn_server(app).await
}

/// Gemini `generateContent` stand-in answering with a fixed `candidates` array
#[derive(Clone)]
pub struct FakeGemini {
    pub candidates: serde_json::Value,
    pub keys_seen: Arc<Mutex<Vec<String>>>,
}

impl FakeGemini {
    pub fn new(candidates: serde_json::Value) -> Self {
        Self {
            candidates,
            keys_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply split across several text parts of one candidate
    pub fn with_parts(parts: &[&str]) -> Self {
        let parts: Vec<_> = parts.iter().map(|text| json!({ "text": text })).collect();
        Self::new(json!([{ "content": { "parts": parts, "role": "model" } }]))
    }

    pub fn keys_seen(&self) -> Vec<String> {
        self.keys_seen.lock().unwrap().clone()
    }
}

async fn gemini_handler(
    State(gemini): State<FakeGemini>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    if let Some(key) = params.get("key") {
        gemini.keys_seen.lock().unwrap().push(key.clone());
    }
    Json(json!({ "candidates": gemini.candidates }))
}

pub async fn spawn_gemini_backend(gemini: FakeGemini) -> String {
    let app = Router::new()
        .route("/models/:call", post(gemini_handler))
        .with_state(gemini);
    spawn_server(app).await
}

pub fn gemini_generator(gemini_base_url: &str) -> QuizGenerator {
    QuizGenerator::from_config(&LLMConfig {
        api_key: Some("gemini-test-key".to_string()),
        base_url: Some(gemini_base_url.to_string()),
        provider: LLMProviderType::Gemini,
        model: Some("test-model".to_string()),
        timeout_secs: 5,
        verify_on_startup: false,
    })
}

pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_step: Duration::from_millis(10),
        timeout: Duration::from_millis(300),
    }
}

pub fn fetcher_for(base_url: &str) -> WikipediaFetcher {
    let config = WikipediaConfig {
        base_url: Some(base_url.to_string()),
        ..WikipediaConfig::default()
    };
    WikipediaFetcher::with_retry_policy(&config, fast_retry_policy()).unwrap()
}

pub fn openai_config(llm_base_url: &str) -> LLMConfig {
    LLMConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(llm_base_url.to_string()),
        provider: LLMProviderType::OpenAI,
        model: Some("test-model".to_string()),
        timeout_secs: 5,
        verify_on_startup: false,
    }
}

pub fn live_generator(llm_base_url: &str) -> QuizGenerator {
    QuizGenerator::from_config(&openai_config(llm_base_url))
}

pub async fn service_for(base_url: &str, generator: QuizGenerator) -> (QuizService, QuizStore) {
    let store = QuizStore::new("sqlite::memory:").await.unwrap();
    let service = QuizService::new(fetcher_for(base_url), generator, store.clone());
    (service, store)
}

/// A well-formed backend reply, wrapped in a markdown fence the way chat models often do
pub fn valid_llm_reply() -> String {
    format!("Here is the quiz:\n```json\n{}\n```", valid_quiz_json())
}

pub fn valid_quiz_json() -> serde_json::Value {
    json!({
        "id": 1,
        "url": "https://example.invalid/wrong",
        "title": "Wrong title",
        "summary": "Alan Turing was an English mathematician. He worked at Bletchley Park.",
        "key_entities": {
            "people": ["Alan Turing"],
            "organizations": ["Bletchley Park"],
            "locations": ["England"]
        },
        "sections": ["Early life", "Legacy"],
        "quiz": (1..=5).map(|n| json!({
            "question": format!("Question {}?", n),
            "options": ["Bletchley Park", "Cambridge", "Oxford", "Manchester"],
            "answer": "Bletchley Park",
            "difficulty": if n % 2 == 0 { "medium" } else { "easy" },
            "explanation": "Stated in the article."
        })).collect::<Vec<_>>(),
        "related_topics": ["Enigma machine", "Turing test", "Computability"]
    })
}
