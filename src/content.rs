//! Shapes of generated learning content.
//!
//! Everything here arrives from the content generator as JSON. Parsing alone
//! is not enough: each type exposes `validate` so a structurally valid but
//! unusable response (empty vocabulary, a correct answer missing from the
//! options) is rejected the same way as malformed JSON.

use serde::{Deserialize, Serialize};

use crate::constants::{EXAM_QUESTION_COUNT, MIN_QUIZ_OPTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Lesson,
    Practice,
}

/// A sentence in the language being learned together with its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub target: String,
    pub native: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub target: String,
    pub native: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonContent {
    pub explanation: BilingualText,
    #[serde(default)]
    pub examples: Vec<BilingualText>,
    #[serde(default)]
    pub warnings: Vec<BilingualText>,
    pub vocabulary: Vec<VocabularyItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingText {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Free-text task; there is no single correct string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub instruction: String,
    pub prompt: String,
    pub suggested_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensivePractice {
    pub reading_text: ReadingText,
    pub comprehension_quiz: Vec<QuizQuestion>,
    pub follow_up_tasks: Vec<TaskItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    pub feedback: String,
    pub is_correct: bool,
}

/// Wrapper the generator is asked to produce for the placement exam.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamPaper {
    pub questions: Vec<QuizQuestion>,
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl BilingualText {
    fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.target) || blank(&self.native) {
            return Err("bilingual text is missing a side");
        }
        Ok(())
    }
}

impl LessonContent {
    pub fn validate(&self) -> Result<(), &'static str> {
        self.explanation
            .validate()
            .map_err(|_| "lesson explanation is empty")?;
        if self.vocabulary.is_empty() {
            return Err("lesson has no vocabulary");
        }
        if self
            .vocabulary
            .iter()
            .any(|v| blank(&v.target) || blank(&v.native))
        {
            return Err("lesson vocabulary contains an empty entry");
        }
        for item in self.examples.iter().chain(self.warnings.iter()) {
            item.validate()?;
        }
        Ok(())
    }
}

impl QuizQuestion {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.question) {
            return Err("quiz question text is empty");
        }
        if self.options.len() < MIN_QUIZ_OPTIONS {
            return Err("quiz question has too few options");
        }
        if !self.options.iter().any(|o| o == &self.correct_answer) {
            return Err("quiz correct answer is not among the options");
        }
        Ok(())
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

impl TaskItem {
    fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.instruction) || blank(&self.prompt) {
            return Err("follow-up task is missing its instruction or prompt");
        }
        Ok(())
    }
}

impl ComprehensivePractice {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.reading_text.content) {
            return Err("practice reading text is empty");
        }
        if self.comprehension_quiz.is_empty() {
            return Err("practice has no comprehension questions");
        }
        for question in &self.comprehension_quiz {
            question.validate()?;
        }
        if self.follow_up_tasks.is_empty() {
            return Err("practice has no follow-up tasks");
        }
        for task in &self.follow_up_tasks {
            task.validate()?;
        }
        Ok(())
    }

    pub fn task(&self, index: usize) -> Option<&TaskItem> {
        self.follow_up_tasks.get(index)
    }
}

impl ExamPaper {
    /// Validates the paper and trims it to the fixed exam length.
    pub fn into_questions(self) -> Result<Vec<QuizQuestion>, &'static str> {
        let mut questions = self.questions;
        if questions.len() < EXAM_QUESTION_COUNT {
            return Err("exam has fewer questions than required");
        }
        questions.truncate(EXAM_QUESTION_COUNT);
        for question in &questions {
            question.validate()?;
        }
        Ok(questions)
    }
}
