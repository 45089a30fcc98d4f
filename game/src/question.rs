//! Question side-channel: wire types, the async service seam, and the
//! built-in deterministic question bank.

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::error::{QuestionBankError, QuestionServiceError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub count: u32,
}

impl QuestionRequest {
    pub fn single(topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Compared by exact string equality against the selected option.
    pub answer: String,
}

impl Question {
    pub fn is_correct(&self, selected: &str) -> bool {
        self.answer == selected
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionResponse {
    /// The first usable question, or why there is none.
    pub fn into_first(self) -> Result<Question, QuestionServiceError> {
        let question = self
            .questions
            .into_iter()
            .next()
            .ok_or(QuestionServiceError::Empty)?;
        if question.options.is_empty() {
            return Err(QuestionServiceError::Malformed(
                "question has no options".to_string(),
            ));
        }
        Ok(question)
    }
}

#[async_trait]
pub trait QuestionService: Send + Sync {
    async fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, QuestionServiceError>;
}

#[async_trait]
impl<T: QuestionService + ?Sized> QuestionService for Box<T> {
    async fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, QuestionServiceError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T: QuestionService + ?Sized> QuestionService for Arc<T> {
    async fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, QuestionServiceError> {
        (**self).fetch(request).await
    }
}

/// Offline question source keyed by difficulty. Topic is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: BTreeMap<Difficulty, Vec<Question>>,
}

impl QuestionBank {
    pub fn new(questions: BTreeMap<Difficulty, Vec<Question>>) -> Result<Self, QuestionBankError> {
        for difficulty in Difficulty::ALL {
            if questions.get(&difficulty).is_none_or(Vec::is_empty) {
                return Err(QuestionBankError::MissingDifficulty(difficulty));
            }
        }
        Ok(Self { questions })
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| QuestionBankError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let questions: BTreeMap<Difficulty, Vec<Question>> = serde_json::from_slice(&bytes)
            .map_err(|source| QuestionBankError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let bank = Self::new(questions)?;
        tracing::info!(path = %path.display(), questions = bank.len(), "loaded question bank");
        Ok(bank)
    }

    pub fn builtin() -> Self {
        let mut questions = BTreeMap::new();
        questions.insert(
            Difficulty::Easy,
            vec![
                q("What is 3 + 4?", &["6", "7", "8", "9"], "7"),
                q("What is 10 - 6?", &["2", "3", "4", "5"], "4"),
                q("How many sides does a triangle have?", &["2", "3", "4", "5"], "3"),
                q("What is 5 × 2?", &["7", "10", "12", "25"], "10"),
            ],
        );
        questions.insert(
            Difficulty::Medium,
            vec![
                q("What is 12 × 12?", &["124", "134", "144", "154"], "144"),
                q("What is 15% of 200?", &["15", "20", "30", "45"], "30"),
                q("What is the square root of 81?", &["7", "8", "9", "11"], "9"),
                q("Solve for x: 2x + 6 = 20", &["5", "6", "7", "8"], "7"),
            ],
        );
        questions.insert(
            Difficulty::Hard,
            vec![
                q("What is the derivative of x³?", &["x²", "3x²", "3x", "x³/3"], "3x²"),
                q("What is log₂(1024)?", &["8", "9", "10", "12"], "10"),
                q(
                    "How many edges does a cube have?",
                    &["8", "10", "12", "14"],
                    "12",
                ),
                q("What is 17 × 23?", &["371", "381", "391", "401"], "391"),
            ],
        );
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deterministic pick: the `index`-th question for the requested
    /// difficulty, wrapping around.
    pub fn question_at(&self, difficulty: Difficulty, index: usize) -> Option<&Question> {
        let list = self.questions.get(&difficulty)?;
        if list.is_empty() {
            return None;
        }
        list.get(index % list.len())
    }

    pub fn response_at(&self, request: &QuestionRequest, index: usize) -> QuestionResponse {
        let count = request.count.max(1) as usize;
        let questions = (0..count)
            .filter_map(|i| self.question_at(request.difficulty, index + i).cloned())
            .collect();
        QuestionResponse { questions }
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

fn q(question: &str, options: &[&str], answer: &str) -> Question {
    Question {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer: answer.to_string(),
    }
}

/// A `QuestionBank` served through the async seam, round-robin per call.
#[derive(Debug, Default)]
pub struct BankQuestionService {
    bank: QuestionBank,
    cursor: AtomicUsize,
}

impl BankQuestionService {
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuestionService for BankQuestionService {
    async fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, QuestionServiceError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let response = self.bank.response_at(request, index);
        tracing::debug!(
            difficulty = %request.difficulty,
            index,
            questions = response.questions.len(),
            "served question from bank"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_wire_shape() {
        let json = serde_json::to_value(QuestionRequest::single("fractions", Difficulty::Medium))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"topic": "fractions", "difficulty": "Medium", "count": 1})
        );
    }

    #[test]
    fn response_first_question_or_error() {
        let empty: QuestionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_first(), Err(QuestionServiceError::Empty));

        let no_options = QuestionResponse {
            questions: vec![q("?", &[], "x")],
        };
        assert!(matches!(
            no_options.into_first(),
            Err(QuestionServiceError::Malformed(_))
        ));

        let ok: QuestionResponse = serde_json::from_str(
            r#"{"questions":[{"question":"2+2?","options":["3","4"],"answer":"4"}]}"#,
        )
        .unwrap();
        let question = ok.into_first().unwrap();
        assert!(question.is_correct("4"));
        assert!(!question.is_correct("4 "));
        assert_eq!(question.option(1), Some("4"));
        assert_eq!(question.option(2), None);
    }

    #[test]
    fn builtin_bank_answers_are_among_options() {
        let bank = QuestionBank::builtin();
        assert!(!bank.is_empty());
        for difficulty in Difficulty::ALL {
            for i in 0..4 {
                let question = bank.question_at(difficulty, i).unwrap();
                assert!(question.options.contains(&question.answer));
            }
        }
    }

    #[test]
    fn question_at_wraps_around() {
        let bank = QuestionBank::builtin();
        assert_eq!(
            bank.question_at(Difficulty::Easy, 0),
            bank.question_at(Difficulty::Easy, 4)
        );
    }

    #[test]
    fn bank_requires_every_difficulty() {
        let mut questions = BTreeMap::new();
        questions.insert(Difficulty::Easy, vec![q("a", &["b"], "b")]);
        questions.insert(Difficulty::Medium, vec![]);
        assert!(matches!(
            QuestionBank::new(questions),
            Err(QuestionBankError::MissingDifficulty(Difficulty::Medium))
        ));
    }

    #[tokio::test]
    async fn bank_service_rotates_questions() {
        let service = BankQuestionService::new(QuestionBank::builtin());
        let request = QuestionRequest::single("math", Difficulty::Easy);
        let first = service.fetch(&request).await.unwrap().into_first().unwrap();
        let second = service.fetch(&request).await.unwrap().into_first().unwrap();
        assert_ne!(first, second);
    }
}
