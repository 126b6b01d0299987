use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Number of answer options every question must carry
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Article text as produced by the fetcher and extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy", alias = "EASY")]
    Easy,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Hard", alias = "HARD")]
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub difficulty: Difficulty,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn answer_is_an_option(&self) -> bool {
        self.options.iter().any(|option| option == &self.answer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEntities {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Quiz content as returned by a generator, before the store assigns an id.
///
/// Backends sometimes echo the prompt's `quiz` key for the question list, so it is
/// accepted as an alias. Unknown keys (a made-up `id`, for instance) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub key_entities: KeyEntities,
    #[serde(default)]
    pub sections: Vec<String>,
    /// A reply carrying both `quiz` and `questions` is a duplicate field and fails to parse
    #[serde(alias = "quiz")]
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

impl GeneratedQuiz {
    /// Reject output that could not be served back as a well-formed quiz
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.questions.is_empty() {
            return Err(PipelineError::Generation(
                "quiz contains no questions".to_string(),
            ));
        }

        for (index, question) in self.questions.iter().enumerate() {
            let number = index + 1;
            if question.question.trim().is_empty() {
                return Err(PipelineError::Generation(format!(
                    "question {} has empty text",
                    number
                )));
            }
            if question.options.len() != OPTIONS_PER_QUESTION {
                return Err(PipelineError::Generation(format!(
                    "question {} has {} options, expected {}",
                    number,
                    question.options.len(),
                    OPTIONS_PER_QUESTION
                )));
            }
            if !question.answer_is_an_option() {
                return Err(PipelineError::Generation(format!(
                    "question {} answer '{}' is not one of its options",
                    number, question.answer
                )));
            }
        }

        Ok(())
    }
}

/// A persisted quiz: the store-assigned id plus the generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    #[serde(flatten)]
    pub content: GeneratedQuiz,
}

/// Full database row for a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuizRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub date_generated: DateTime<Utc>,
    pub scraped_content: Option<String>,
    pub full_quiz_json: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizHistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub date_generated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuizRequest {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: "Which planet is closest to the Sun?".to_string(),
            options: vec![
                "Mercury".to_string(),
                "Venus".to_string(),
                "Earth".to_string(),
                "Mars".to_string(),
            ],
            answer: answer.to_string(),
            difficulty: Difficulty::Easy,
            explanation: "Mercury orbits closest.".to_string(),
        }
    }

    fn quiz_with(questions: Vec<QuizQuestion>) -> GeneratedQuiz {
        GeneratedQuiz {
            url: "https://en.wikipedia.org/wiki/Mercury_(planet)".to_string(),
            title: "Mercury (planet)".to_string(),
            summary: "Mercury is the smallest planet.".to_string(),
            key_entities: KeyEntities::default(),
            sections: vec![],
            questions,
            related_topics: vec![],
        }
    }

    #[test]
    fn test_backend_reply_with_quiz_key_parses() {
        let reply = json!({
            "id": 1,
            "url": "https://en.wikipedia.org/wiki/Mercury_(planet)",
            "title": "Mercury (planet)",
            "summary": "Mercury is the smallest planet.",
            "key_entities": {"people": [], "organizations": ["NASA"], "locations": []},
            "sections": ["Orbit"],
            "quiz": [{
                "question": "Which planet is closest to the Sun?",
                "options": ["Mercury", "Venus", "Earth", "Mars"],
                "answer": "Mercury",
                "difficulty": "Medium",
                "explanation": "Mercury orbits closest."
            }],
            "related_topics": ["Venus"]
        });

        let quiz: GeneratedQuiz = serde_json::from_value(reply).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].difficulty, Difficulty::Medium);
        assert_eq!(quiz.key_entities.organizations, vec!["NASA".to_string()]);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn test_reply_with_both_question_keys_fails_to_parse() {
        let reply = r#"{"summary":"s","quiz":[],"questions":[]}"#;
        let err = serde_json::from_str::<GeneratedQuiz>(reply).unwrap_err();
        assert!(err.to_string().contains("duplicate field"));
    }

    #[test]
    fn test_unknown_difficulty_is_rejected() {
        let value = json!({
            "question": "q",
            "options": ["a", "b", "c", "d"],
            "answer": "a",
            "difficulty": "impossible",
            "explanation": "e"
        });
        assert!(serde_json::from_value::<QuizQuestion>(value).is_err());
    }

    #[test]
    fn test_validate_rejects_answer_outside_options() {
        let quiz = quiz_with(vec![question("Pluto")]);
        let err = quiz.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_option_count() {
        let mut q = question("Mercury");
        q.options.pop();
        assert!(quiz_with(vec![q]).validate().is_err());
        assert!(quiz_with(vec![]).validate().is_err());
    }

    #[test]
    fn test_quiz_serializes_flat() {
        let quiz = Quiz {
            id: 7,
            content: quiz_with(vec![question("Mercury")]),
        };
        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["title"], "Mercury (planet)");
        assert_eq!(value["questions"][0]["difficulty"], "easy");

        let back: Quiz = serde_json::from_value(value).unwrap();
        assert_eq!(back, quiz);
    }
}
