use std::time::Instant;
use uuid::Uuid;

use crate::database::QuizStore;
use crate::errors::{PipelineError, PipelineStage};
use crate::extractor::extract_article_text;
use crate::fetcher::WikipediaFetcher;
use crate::log_pipeline_stage;
use crate::models::{Article, Quiz, QuizHistoryEntry};
use crate::quiz_generator::QuizGenerator;

/// Runs the fetch → extract → generate → persist pipeline and serves stored quizzes
#[derive(Clone)]
pub struct QuizService {
    fetcher: WikipediaFetcher,
    generator: QuizGenerator,
    store: QuizStore,
}

impl QuizService {
    pub fn new(fetcher: WikipediaFetcher, generator: QuizGenerator, store: QuizStore) -> Self {
        Self {
            fetcher,
            generator,
            store,
        }
    }

    /// Fetch and extract an article without generating anything
    pub async fn scrape_article(&self, url: &str) -> Result<Article, PipelineError> {
        let fetched = self.fetcher.fetch_article(url).await?;
        let content = extract_article_text(&fetched.html, &fetched.summary)?;
        Ok(Article {
            title: fetched.title,
            url: url.to_string(),
            content,
        })
    }

    /// Build, persist and return a quiz for `url`. Nothing is stored unless every stage
    /// succeeds.
    pub async fn generate_quiz(&self, url: &str) -> Result<Quiz, PipelineError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        log_pipeline_stage!(request_id, PipelineStage::Received);

        match self.run_pipeline(request_id, url).await {
            Ok(quiz) => {
                log_pipeline_stage!(
                    request_id,
                    PipelineStage::Done,
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(quiz)
            }
            Err(e) => {
                log_pipeline_stage!(request_id, failed = e);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, request_id: Uuid, url: &str) -> Result<Quiz, PipelineError> {
        log_pipeline_stage!(request_id, PipelineStage::Fetching);
        let fetched = self.fetcher.fetch_article(url).await?;

        log_pipeline_stage!(request_id, PipelineStage::Extracting);
        let content = extract_article_text(&fetched.html, &fetched.summary)?;
        let article = Article {
            title: fetched.title,
            url: url.to_string(),
            content,
        };

        log_pipeline_stage!(request_id, PipelineStage::Generating);
        let mut generated = self
            .generator
            .generate(&article.title, &article.content, &article.url)
            .await?;
        generated.validate()?;
        generated.title = article.title.clone();
        generated.url = article.url.clone();

        log_pipeline_stage!(request_id, PipelineStage::Persisting);
        let id = self
            .store
            .save(&article.url, &article.title, Some(&article.content), &generated)
            .await?;

        Ok(Quiz {
            id,
            content: generated,
        })
    }

    pub async fn history(&self) -> Result<Vec<QuizHistoryEntry>, PipelineError> {
        self.store.list().await
    }

    pub async fn get_quiz(&self, id: i64) -> Result<Quiz, PipelineError> {
        self.store.get(id).await
    }

    pub async fn delete_quiz(&self, id: i64) -> Result<(), PipelineError> {
        self.store.delete(id).await
    }
}
