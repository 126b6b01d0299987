use std::time::Instant;

use crate::config::LLMConfig;
use crate::errors::PipelineError;
use crate::llm_providers::{JsonResponseParser, LLMProvider, LLMProviderFactory};
use crate::models::{Difficulty, GeneratedQuiz, KeyEntities, QuizQuestion};
use crate::log_llm_operation;

const SYSTEM_MESSAGE: &str = "You are an expert educator who writes quizzes from reference articles. Always respond with valid JSON in the requested format and nothing else.";

const STARTUP_CHECK_PROMPT: &str = "Reply with the single word: ready";

/// Render the instruction sent to the generative backend
pub fn render_quiz_prompt(title: &str, content: &str, url: &str) -> String {
    format!(
        r#"You are creating a comprehensive quiz from a Wikipedia article. Analyze the provided article content and create a detailed quiz with accurate information based on the article.

Article Title: {title}
Article Content: {content}
Article URL: {url}

Based on this article, create a quiz with the following structure:

1. Summary: a concise 2-3 sentence summary of the article's main points
2. Key Entities: the important people, organizations and locations mentioned in the article, each in its own list
3. Sections: the main sections or topics covered in the article
4. Quiz Questions: exactly 5 multiple-choice questions that test understanding of the article. Each question must:
   - Be directly based on information from the article
   - Have exactly 4 options, written as plain text without letter prefixes
   - Have one clearly correct answer, copied exactly from the options
   - Include a difficulty level: easy, medium or hard
   - Include an explanation of why the answer is correct
5. Related Topics: 3-5 related topics that readers might be interested in

IMPORTANT: All information in the quiz must be accurate and directly derived from the article content above. Do not add outside knowledge or assumptions.

Return the response in the following JSON format:
{{
    "url": "{url}",
    "title": "{title}",
    "summary": "Brief summary here",
    "key_entities": {{
        "people": ["Person 1", "Person 2"],
        "organizations": ["Organization 1"],
        "locations": ["Location 1"]
    }},
    "sections": ["Section 1", "Section 2", "Section 3"],
    "questions": [
        {{
            "question": "Question text here?",
            "options": ["Option A", "Option B", "Option C", "Option D"],
            "answer": "Option A",
            "difficulty": "easy",
            "explanation": "Explanation of why this is correct"
        }}
    ],
    "related_topics": ["Topic 1", "Topic 2", "Topic 3"]
}}

Make the questions challenging but fair."#
    )
}

/// Where quizzes come from. Chosen once, when the generator is built.
#[derive(Debug, Clone)]
pub enum GeneratorBackend {
    Live(LLMProvider),
    Stub,
}

impl GeneratorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorBackend::Live(provider) => provider.provider_name(),
            GeneratorBackend::Stub => "stub",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuizGenerator {
    backend: GeneratorBackend,
    json_parser: JsonResponseParser,
}

impl QuizGenerator {
    pub fn new(backend: GeneratorBackend) -> Self {
        Self {
            backend,
            json_parser: JsonResponseParser,
        }
    }

    pub fn stub() -> Self {
        Self::new(GeneratorBackend::Stub)
    }

    /// Select the backend from configuration. Anything that prevents building a live
    /// backend falls back to the stub.
    pub fn from_config(config: &LLMConfig) -> Self {
        let Some(api_key) = config.api_key.clone() else {
            log_llm_operation!(
                warn,
                "init_generator",
                "No LLM API key configured, using stub quiz generator"
            );
            return Self::stub();
        };

        match LLMProviderFactory::create_provider(
            config.provider,
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.timeout(),
        ) {
            Ok(provider) => {
                tracing::info!(
                    provider = provider.provider_name(),
                    model = %provider.model_name(),
                    "Initialized live quiz generator"
                );
                Self::new(GeneratorBackend::Live(provider))
            }
            Err(e) => {
                log_llm_operation!(
                    warn,
                    "init_generator",
                    format!("Failed to initialize LLM backend ({}), using stub quiz generator", e)
                );
                Self::stub()
            }
        }
    }

    /// Like [`QuizGenerator::from_config`], and when `verify_on_startup` is set, checks the
    /// live backend once, falling back to the stub if the check fails.
    pub async fn initialize(config: &LLMConfig) -> Self {
        let generator = Self::from_config(config);
        if !config.verify_on_startup {
            return generator;
        }

        if let GeneratorBackend::Live(provider) = &generator.backend {
            if let Err(e) = provider.make_request(None, STARTUP_CHECK_PROMPT).await {
                log_llm_operation!(
                    warn,
                    "verify_generator",
                    format!("LLM backend startup check failed ({}), using stub quiz generator", e)
                );
                return Self::stub();
            }
            tracing::info!(provider = provider.provider_name(), "LLM backend startup check succeeded");
        }

        generator
    }

    pub fn backend(&self) -> &GeneratorBackend {
        &self.backend
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.backend, GeneratorBackend::Stub)
    }

    /// Produce a quiz for the article. Live backend failures are returned, never replaced
    /// by the stub.
    pub async fn generate(
        &self,
        title: &str,
        content: &str,
        url: &str,
    ) -> Result<GeneratedQuiz, PipelineError> {
        let started = Instant::now();
        log_llm_operation!(
            start,
            "generate_quiz",
            backend = self.backend.name(),
            content_length = content.len()
        );

        let quiz = match &self.backend {
            GeneratorBackend::Stub => stub_quiz(title, url),
            GeneratorBackend::Live(provider) => {
                self.generate_live(provider, title, content, url).await?
            }
        };

        log_llm_operation!(
            success,
            "generate_quiz",
            backend = self.backend.name(),
            duration_ms = started.elapsed().as_millis() as u64,
            questions = quiz.questions.len()
        );

        Ok(quiz)
    }

    async fn generate_live(
        &self,
        provider: &LLMProvider,
        title: &str,
        content: &str,
        url: &str,
    ) -> Result<GeneratedQuiz, PipelineError> {
        let prompt = render_quiz_prompt(title, content, url);

        let response_text = provider
            .make_request(Some(SYSTEM_MESSAGE), &prompt)
            .await
            .map_err(|e| {
                log_llm_operation!(error, "generate_quiz", backend = provider.provider_name(), error = e);
                PipelineError::Generation(format!("{} request failed: {}", provider.provider_name(), e))
            })?;

        tracing::debug!(response_content = %response_text, "Raw LLM response for quiz generation");

        let quiz = self
            .json_parser
            .parse_json_response::<GeneratedQuiz>(&response_text)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    json_content = %JsonResponseParser::extract_json_from_response(&response_text),
                    "Failed to parse quiz generation JSON response"
                );
                PipelineError::Generation(format!("malformed quiz reply: {}", e))
            })?;

        quiz.validate()?;
        Ok(quiz)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Fixed-shape quiz used when no live backend is available
pub fn stub_quiz(title: &str, url: &str) -> GeneratedQuiz {
    let questions = vec![
        QuizQuestion {
            question: format!("What is the main topic of {}?", title),
            options: vec![
                title.to_string(),
                "Unrelated Topic 1".to_string(),
                "Unrelated Topic 2".to_string(),
                "Unrelated Topic 3".to_string(),
            ],
            answer: title.to_string(),
            difficulty: Difficulty::Easy,
            explanation: format!("The main topic of the article is {}.", title),
        },
        QuizQuestion {
            question: "What type of information does this article provide?".to_string(),
            options: strings(&["Educational content", "Entertainment", "News", "Advertisements"]),
            answer: "Educational content".to_string(),
            difficulty: Difficulty::Easy,
            explanation: "This is an educational article providing information about the topic."
                .to_string(),
        },
        QuizQuestion {
            question: "Which of these is a key section mentioned?".to_string(),
            options: strings(&["Introduction", "Random Section", "Unrelated", "None"]),
            answer: "Introduction".to_string(),
            difficulty: Difficulty::Medium,
            explanation: "The article typically includes an Introduction section.".to_string(),
        },
        QuizQuestion {
            question: "What is the purpose of this type of article?".to_string(),
            options: strings(&["To inform readers", "To sell products", "To entertain", "To advertise"]),
            answer: "To inform readers".to_string(),
            difficulty: Difficulty::Easy,
            explanation: "Wikipedia articles are written to inform and educate readers.".to_string(),
        },
        QuizQuestion {
            question: "How is information typically organized in such articles?".to_string(),
            options: strings(&[
                "In sections and subsections",
                "Randomly",
                "Only in paragraphs",
                "As a single block",
            ]),
            answer: "In sections and subsections".to_string(),
            difficulty: Difficulty::Hard,
            explanation: "Articles are organized into logical sections for readability.".to_string(),
        },
    ];

    GeneratedQuiz {
        url: url.to_string(),
        title: title.to_string(),
        summary: format!(
            "This is a sample summary for {}. The article contains information about various topics related to the subject.",
            title
        ),
        key_entities: KeyEntities {
            people: strings(&["Sample Person 1", "Sample Person 2"]),
            organizations: strings(&["Sample Organization"]),
            locations: strings(&["Sample Location"]),
        },
        sections: strings(&["Introduction", "History", "Key Concepts", "Applications"]),
        questions,
        related_topics: strings(&["Related Topic 1", "Related Topic 2", "Related Topic 3"]),
    }
}
