use std::collections::HashSet;

use futures::future::BoxFuture;

use crate::constants::EXAM_QUESTION_COUNT;
use crate::content::{
    AnswerEvaluation, BilingualText, ComprehensivePractice, LessonContent, QuizQuestion,
    ReadingText, TaskItem, VocabularyItem,
};
use crate::curriculum::{Level, Topic};
use crate::services::generator::{ContentGenerator, GenerationResult};

/// Offline generator with deterministic content, selected by `LLM_MOCK=true`.
#[derive(Debug, Clone, Default)]
pub struct MockContentGenerator;

impl MockContentGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn lesson(level: Level, topic: &Topic) -> LessonContent {
        let bi = |target: String, native: String| BilingualText { target, native };
        LessonContent {
            explanation: bi(
                format!("Lección {level}: {}", topic.title),
                format!("{level} lesson: {}", topic.title),
            ),
            examples: (1..=3)
                .map(|i| bi(format!("Ejemplo {i} de {}", topic.id), format!("Example {i} for {}", topic.id)))
                .collect(),
            warnings: vec![bi(
                "No olvides la concordancia.".to_string(),
                "Don't forget agreement.".to_string(),
            )],
            vocabulary: (1..=5)
                .map(|i| VocabularyItem {
                    target: format!("{}-palabra-{i}", topic.id),
                    native: format!("{}-word-{i}", topic.id),
                    pronunciation: (i % 2 == 1).then(|| format!("pa-LA-bra-{i}")),
                })
                .collect(),
        }
    }

    pub fn practice(level: Level, topic: &Topic) -> ComprehensivePractice {
        ComprehensivePractice {
            reading_text: ReadingText {
                title: format!("{} ({level})", topic.title),
                content: format!("Un texto corto sobre {}.", topic.title),
            },
            comprehension_quiz: (1..=3).map(|i| numbered_question(i, topic.id)).collect(),
            follow_up_tasks: (1..=3)
                .map(|i| TaskItem {
                    instruction: format!("Task {i}: answer in a full sentence."),
                    prompt: format!("Pregunta {i} sobre {}", topic.id),
                    suggested_answer: format!("respuesta modelo {i}"),
                })
                .collect(),
        }
    }

    pub fn exam() -> Vec<QuizQuestion> {
        (1..=EXAM_QUESTION_COUNT)
            .map(|i| numbered_question(i, "exam"))
            .collect()
    }

    pub fn evaluate(task: &TaskItem, user_answer: &str) -> AnswerEvaluation {
        let expected = words(&task.suggested_answer);
        let given = words(user_answer);
        let overlap = expected.intersection(&given).count();
        let is_correct = !expected.is_empty() && overlap * 2 >= expected.len();
        let feedback = if is_correct {
            "Well done, your answer fulfils the task.".to_string()
        } else {
            format!("Not quite. A possible answer: \"{}\".", task.suggested_answer)
        };
        AnswerEvaluation {
            feedback,
            is_correct,
        }
    }
}

fn numbered_question(i: usize, scope: &str) -> QuizQuestion {
    let options: Vec<String> = ["a", "b", "c", "d"]
        .iter()
        .map(|o| format!("{scope}-{i}-{o}"))
        .collect();
    QuizQuestion {
        question: format!("Question {i} ({scope})"),
        correct_answer: options[i % options.len()].clone(),
        options,
        explanation: Some(format!("Option {} is correct.", i % 4 + 1)),
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

impl ContentGenerator for MockContentGenerator {
    fn fetch_lesson(&self, level: Level, topic: Topic) -> BoxFuture<'_, GenerationResult<LessonContent>> {
        Box::pin(async move { Ok(Self::lesson(level, &topic)) })
    }

    fn fetch_practice(
        &self,
        level: Level,
        topic: Topic,
    ) -> BoxFuture<'_, GenerationResult<ComprehensivePractice>> {
        Box::pin(async move { Ok(Self::practice(level, &topic)) })
    }

    fn fetch_exam(&self) -> BoxFuture<'_, GenerationResult<Vec<QuizQuestion>>> {
        Box::pin(async move { Ok(Self::exam()) })
    }

    fn evaluate_answer(
        &self,
        task: TaskItem,
        user_answer: String,
    ) -> BoxFuture<'_, GenerationResult<AnswerEvaluation>> {
        Box::pin(async move { Ok(Self::evaluate(&task, &user_answer)) })
    }
}
