use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tokio::sync::watch;

use lingo_tutor::content::{
    AnswerEvaluation, ComprehensivePractice, LessonContent, QuizQuestion, TaskItem,
};
use lingo_tutor::curriculum::{Level, Topic};
use lingo_tutor::services::generator::{ContentGenerator, GenerationError, GenerationResult};
use lingo_tutor::services::mock_generator::MockContentGenerator;

/// Mock content with call counters, switchable failures and a gate that
/// holds every response until opened.
pub struct ScriptedGenerator {
    pub lesson_calls: AtomicUsize,
    pub practice_calls: AtomicUsize,
    pub exam_calls: AtomicUsize,
    pub evaluation_calls: AtomicUsize,
    pub fail_lesson: AtomicBool,
    pub fail_practice: AtomicBool,
    pub fail_exam: AtomicBool,
    pub fail_evaluation: AtomicBool,
    gate: watch::Sender<bool>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            lesson_calls: AtomicUsize::new(0),
            practice_calls: AtomicUsize::new(0),
            exam_calls: AtomicUsize::new(0),
            evaluation_calls: AtomicUsize::new(0),
            fail_lesson: AtomicBool::new(false),
            fail_practice: AtomicBool::new(false),
            fail_exam: AtomicBool::new(false),
            fail_evaluation: AtomicBool::new(false),
            gate,
        }
    }

    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub fn lessons(&self) -> usize {
        self.lesson_calls.load(Ordering::SeqCst)
    }

    pub fn practices(&self) -> usize {
        self.practice_calls.load(Ordering::SeqCst)
    }

    pub fn exams(&self) -> usize {
        self.exam_calls.load(Ordering::SeqCst)
    }

    pub fn evaluations(&self) -> usize {
        self.evaluation_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_lesson(&self, fail: bool) {
        self.fail_lesson.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_practice(&self, fail: bool) {
        self.fail_practice.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_exam(&self, fail: bool) {
        self.fail_exam.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_evaluation(&self, fail: bool) {
        self.fail_evaluation.store(fail, Ordering::SeqCst);
    }

    async fn pass_gate(&self) {
        let mut rx = self.gate.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }

    fn outcome<T>(flag: &AtomicBool, what: &str, value: impl FnOnce() -> T) -> GenerationResult<T> {
        if flag.load(Ordering::SeqCst) {
            Err(GenerationError::new(format!("The {what} could not be generated")))
        } else {
            Ok(value())
        }
    }
}

impl ContentGenerator for ScriptedGenerator {
    fn fetch_lesson(&self, level: Level, topic: Topic) -> BoxFuture<'_, GenerationResult<LessonContent>> {
        Box::pin(async move {
            self.lesson_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            Self::outcome(&self.fail_lesson, "lesson", || {
                MockContentGenerator::lesson(level, &topic)
            })
        })
    }

    fn fetch_practice(
        &self,
        level: Level,
        topic: Topic,
    ) -> BoxFuture<'_, GenerationResult<ComprehensivePractice>> {
        Box::pin(async move {
            self.practice_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            Self::outcome(&self.fail_practice, "practice session", || {
                MockContentGenerator::practice(level, &topic)
            })
        })
    }

    fn fetch_exam(&self) -> BoxFuture<'_, GenerationResult<Vec<QuizQuestion>>> {
        Box::pin(async move {
            self.exam_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            Self::outcome(&self.fail_exam, "exam", MockContentGenerator::exam)
        })
    }

    fn evaluate_answer(
        &self,
        task: TaskItem,
        user_answer: String,
    ) -> BoxFuture<'_, GenerationResult<AnswerEvaluation>> {
        Box::pin(async move {
            self.evaluation_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            Self::outcome(&self.fail_evaluation, "answer evaluation", || {
                MockContentGenerator::evaluate(&task, &user_answer)
            })
        })
    }
}
