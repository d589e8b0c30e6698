//! Quiz domain types
//!
//! Shape of the result object written by the external quiz worker.

use serde::{Deserialize, Serialize};

/// A generated quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    pub correct_answer_index: usize,
}

impl Question {
    /// Text of the correct answer, if the index points at one
    pub fn correct_answer(&self) -> Option<&str> {
        self.answers
            .get(self.correct_answer_index)
            .map(String::as_str)
    }

    /// Has choices and a correct answer among them
    pub fn is_answerable(&self) -> bool {
        self.correct_answer().is_some()
    }
}

/// A question the user got wrong, in the form sent to the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuestion {
    pub question: String,
    pub answer_choices: Vec<String>,
    pub correct_answer: String,
}

/// A topic suggested for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTopic {
    pub topic: String,
    pub importance: String,
}

impl Quiz {
    /// Collects the questions at `indices` for review
    ///
    /// Returns the first out-of-range index as the error.
    pub fn review_questions(&self, indices: &[usize]) -> Result<Vec<ReviewQuestion>, usize> {
        indices
            .iter()
            .map(|&i| {
                let q = self.questions.get(i).ok_or(i)?;
                Ok(ReviewQuestion {
                    question: q.question.clone(),
                    answer_choices: q.answers.clone(),
                    correct_answer: q.correct_answer().unwrap_or_default().to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Quiz {
        Quiz {
            questions: vec![
                Question {
                    question: "2 + 2?".to_string(),
                    answers: vec!["3".to_string(), "4".to_string()],
                    correct_answer_index: 1,
                },
                Question {
                    question: "Capital of France?".to_string(),
                    answers: vec!["Paris".to_string(), "Rome".to_string()],
                    correct_answer_index: 0,
                },
            ],
        }
    }

    #[test]
    fn test_parses_worker_output() {
        let raw = r#"{"questions":[{"question":"q","answers":["a","b"],"correctAnswerIndex":1}]}"#;
        let quiz: Quiz = serde_json::from_str(raw).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_answer(), Some("b"));
    }

    #[test]
    fn test_question_without_choices_is_not_answerable() {
        let raw = r#"{"questions":[{"question":"q","answers":[],"correctAnswerIndex":0}]}"#;
        let quiz: Quiz = serde_json::from_str(raw).unwrap();
        assert!(!quiz.questions[0].is_answerable());
        assert!(sample_quiz().questions.iter().all(Question::is_answerable));
    }

    #[test]
    fn test_review_questions_selects_indices() {
        let quiz = sample_quiz();
        let review = quiz.review_questions(&[1]).unwrap();
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].question, "Capital of France?");
        assert_eq!(review[0].correct_answer, "Paris");
    }

    #[test]
    fn test_review_questions_rejects_out_of_range() {
        let quiz = sample_quiz();
        assert_eq!(quiz.review_questions(&[0, 7]), Err(7));
    }
}
