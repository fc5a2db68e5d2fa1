use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::config::LanguageConfig;
use crate::constants::EXAM_QUESTION_COUNT;
use crate::content::{
    AnswerEvaluation, ComprehensivePractice, ExamPaper, LessonContent, QuizQuestion, TaskItem,
};
use crate::curriculum::{Level, Topic};
use crate::services::llm_provider::{ChatMessage, LlmError, LlmProvider};

/// The single failure the session layer sees from content generation.
/// Transport, status, decoding and shape problems all collapse into it;
/// every one of them is retried the same way, by issuing the request again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(value: LlmError) -> Self {
        GenerationError::new(format!("Content generation failed: {value}"))
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Remote producer of lessons, practice sessions, exams and answer feedback.
pub trait ContentGenerator: Send + Sync {
    fn fetch_lesson(&self, level: Level, topic: Topic) -> BoxFuture<'_, GenerationResult<LessonContent>>;

    fn fetch_practice(
        &self,
        level: Level,
        topic: Topic,
    ) -> BoxFuture<'_, GenerationResult<ComprehensivePractice>>;

    fn fetch_exam(&self) -> BoxFuture<'_, GenerationResult<Vec<QuizQuestion>>>;

    fn evaluate_answer(
        &self,
        task: TaskItem,
        user_answer: String,
    ) -> BoxFuture<'_, GenerationResult<AnswerEvaluation>>;
}

pub struct LlmContentGenerator {
    provider: LlmProvider,
    languages: LanguageConfig,
}

impl LlmContentGenerator {
    pub fn new(provider: LlmProvider, languages: LanguageConfig) -> Self {
        Self { provider, languages }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an experienced {target} teacher writing material for a learner whose \
             native language is {native}. Respond with a single JSON object and nothing else. \
             Fields named \"target\" hold {target} text, fields named \"native\" hold {native} text.",
            target = self.languages.target,
            native = self.languages.native,
        )
    }

    async fn request<T: DeserializeOwned>(&self, what: &str, prompt: String) -> GenerationResult<T> {
        let messages = vec![ChatMessage::system(self.system_prompt()), ChatMessage::user(prompt)];
        let raw = self.provider.chat_json(messages).await.map_err(|e| {
            tracing::warn!(request = what, error = %e, "Generator request failed");
            GenerationError::from(e)
        })?;
        parse_payload(what, &raw)
    }
}

fn lesson_prompt(level: Level, topic: &Topic) -> String {
    format!(
        "Write a {level} lesson on \"{title}\". Return JSON with: \
         \"explanation\": {{\"target\", \"native\"}} explaining the grammar or theme; \
         \"examples\": 4-6 items of {{\"target\", \"native\"}}; \
         \"warnings\": 1-3 common mistakes as {{\"target\", \"native\"}}; \
         \"vocabulary\": 8-12 items of {{\"target\", \"native\", \"pronunciation\"}}.",
        title = topic.title,
    )
}

fn practice_prompt(level: Level, topic: &Topic) -> String {
    format!(
        "Create a {level} practice session on \"{title}\". Return JSON with: \
         \"readingText\": {{\"title\", \"content\"}} a short text in the target language; \
         \"comprehensionQuiz\": 4-5 items of {{\"question\", \"options\" (4 strings), \
         \"correctAnswer\" (exactly one of the options), \"explanation\"}}; \
         \"followUpTasks\": 2-3 items of {{\"instruction\", \"prompt\", \"suggestedAnswer\"}} \
         asking the learner to write or transform sentences.",
        title = topic.title,
    )
}

fn exam_prompt() -> String {
    format!(
        "Create a placement exam of exactly {EXAM_QUESTION_COUNT} multiple-choice questions \
         ordered from A1 to B2 difficulty. Return JSON {{\"questions\": [...]}} where each item \
         has \"question\", \"options\" (4 strings), \"correctAnswer\" (exactly one of the options) \
         and \"explanation\"."
    )
}

fn evaluation_prompt(task: &TaskItem, user_answer: &str) -> String {
    format!(
        "Evaluate a learner's answer to a writing task. Task instruction: \"{instruction}\". \
         Prompt: \"{prompt}\". A model answer would be: \"{suggested}\". Learner's answer: \
         \"{answer}\". Accept any answer that is grammatical and fulfils the task, even if it \
         differs from the model answer. Return JSON {{\"feedback\": short encouraging feedback \
         in the learner's native language with corrections if needed, \"isCorrect\": boolean}}.",
        instruction = task.instruction,
        prompt = task.prompt,
        suggested = task.suggested_answer,
        answer = user_answer,
    )
}

/// Models sometimes wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_payload<T: DeserializeOwned>(what: &str, raw: &str) -> GenerationResult<T> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::warn!(request = what, error = %e, "Generator returned malformed JSON");
        GenerationError::new(format!("The {what} could not be generated: malformed response"))
    })
}

fn check(what: &str, result: Result<(), &'static str>) -> GenerationResult<()> {
    result.map_err(|reason| {
        tracing::warn!(request = what, reason, "Generator response failed validation");
        GenerationError::new(format!("The {what} could not be generated: {reason}"))
    })
}

impl ContentGenerator for LlmContentGenerator {
    fn fetch_lesson(&self, level: Level, topic: Topic) -> BoxFuture<'_, GenerationResult<LessonContent>> {
        Box::pin(async move {
            let lesson: LessonContent = self.request("lesson", lesson_prompt(level, &topic)).await?;
            check("lesson", lesson.validate())?;
            Ok(lesson)
        })
    }

    fn fetch_practice(
        &self,
        level: Level,
        topic: Topic,
    ) -> BoxFuture<'_, GenerationResult<ComprehensivePractice>> {
        Box::pin(async move {
            let practice: ComprehensivePractice = self
                .request("practice session", practice_prompt(level, &topic))
                .await?;
            check("practice session", practice.validate())?;
            Ok(practice)
        })
    }

    fn fetch_exam(&self) -> BoxFuture<'_, GenerationResult<Vec<QuizQuestion>>> {
        Box::pin(async move {
            let paper: ExamPaper = self.request("exam", exam_prompt()).await?;
            paper.into_questions().map_err(|reason| {
                tracing::warn!(reason, "Exam paper failed validation");
                GenerationError::new(format!("The exam could not be generated: {reason}"))
            })
        })
    }

    fn evaluate_answer(
        &self,
        task: TaskItem,
        user_answer: String,
    ) -> BoxFuture<'_, GenerationResult<AnswerEvaluation>> {
        Box::pin(async move {
            self.request("answer evaluation", evaluation_prompt(&task, &user_answer))
                .await
        })
    }
}
