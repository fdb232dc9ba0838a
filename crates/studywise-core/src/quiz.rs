//! Quiz questions and grading.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// A usable question has text, exactly four options, and an answer
    /// that is one of them.
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() == OPTIONS_PER_QUESTION
            && self.options.iter().any(|o| o == &self.correct_answer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub index: usize,
    pub chosen: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

impl QuizScore {
    /// Percentage rounded down; 0 for an empty quiz.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.correct * 100 / self.total
        }
    }
}

/// Score `answers` (question index to chosen option) against `quiz`.
/// Unanswered questions count as incorrect; answers for indices outside
/// the quiz are ignored.
pub fn grade(quiz: &[QuizQuestion], answers: &HashMap<usize, String>) -> QuizScore {
    let results: Vec<QuestionResult> = quiz
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let chosen = answers.get(&index).cloned();
            let is_correct = chosen.as_deref() == Some(q.correct_answer.as_str());
            QuestionResult {
                index,
                chosen,
                correct_answer: q.correct_answer.clone(),
                is_correct,
            }
        })
        .collect();

    QuizScore {
        correct: results.iter().filter(|r| r.is_correct).count(),
        total: quiz.len(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(q: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: q.into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: answer.into(),
            explanation: None,
        }
    }

    #[test]
    fn wire_format_uses_correct_answer_camel_case() {
        let json = serde_json::to_value(question("Q?", "B")).unwrap();
        assert_eq!(json["correctAnswer"], "B");
        assert!(json.get("explanation").is_none());

        let parsed: QuizQuestion = serde_json::from_str(
            r#"{"question":"Q?","options":["A","B","C","D"],"correctAnswer":"C","explanation":"why"}"#,
        )
        .unwrap();
        assert_eq!(parsed.explanation.as_deref(), Some("why"));
    }

    #[test]
    fn well_formed_checks() {
        assert!(question("Q?", "A").is_well_formed());
        assert!(!question("  ", "A").is_well_formed());
        assert!(!question("Q?", "E").is_well_formed());

        let mut three = question("Q?", "A");
        three.options.pop();
        assert!(!three.is_well_formed());
    }

    #[test]
    fn grading_counts_unanswered_as_wrong() {
        let quiz = vec![question("1", "A"), question("2", "B"), question("3", "C")];
        let answers = HashMap::from([
            (0, "A".to_string()),
            (1, "D".to_string()),
            (9, "A".to_string()),
        ]);

        let score = grade(&quiz, &answers);
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 3);
        assert_eq!(score.percent(), 33);
        assert!(score.results[0].is_correct);
        assert_eq!(score.results[1].chosen.as_deref(), Some("D"));
        assert!(score.results[2].chosen.is_none());
        assert!(!score.results[2].is_correct);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let score = grade(&[], &HashMap::new());
        assert_eq!(score.total, 0);
        assert_eq!(score.percent(), 0);
    }
}
