mod common;

use std::sync::Arc;
use std::time::Duration;

use lingo_tutor::constants::EXAM_QUESTION_COUNT;
use lingo_tutor::services::mock_generator::MockContentGenerator;
use lingo_tutor::session::exam::{ExamPhase, ExamSession};
use lingo_tutor::session::registry::SessionRegistry;
use lingo_tutor::session::{FetchOutcome, SessionError};

use common::app::session_context;

#[tokio::test]
async fn timeout_on_last_second_scores_zero_and_records_once() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 1, t.ctx.clone());
    assert_eq!(exam.load_questions().await, FetchOutcome::Applied);
    exam.start().unwrap();
    assert_eq!(exam.time_left_secs(), 1);

    assert!(!exam.tick());

    let result = exam.result().unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.total, EXAM_QUESTION_COUNT as u32);
    assert_eq!(exam.phase(), ExamPhase::Finished);
    assert!(exam.finish().unwrap().is_none());
    assert!(!exam.tick());
    assert_eq!(t.ctx.store.exam_history("ana").unwrap(), vec![result]);
}

#[tokio::test]
async fn submit_and_countdown_race_records_exactly_one_result() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 1, t.ctx.clone());
    exam.load_questions().await;
    exam.start().unwrap();

    let ticking = Arc::clone(&exam);
    let submitting = Arc::clone(&exam);
    let tick = tokio::task::spawn_blocking(move || ticking.tick());
    let finish = tokio::task::spawn_blocking(move || submitting.finish());
    tick.await.unwrap();
    finish.await.unwrap().unwrap();

    assert_eq!(exam.phase(), ExamPhase::Finished);
    assert_eq!(t.ctx.store.exam_history("ana").unwrap().len(), 1);
}

#[tokio::test]
async fn perfect_answers_score_full_marks() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 600, t.ctx.clone());
    exam.load_questions().await;
    exam.start().unwrap();

    for (i, q) in MockContentGenerator::exam().iter().enumerate() {
        exam.select_answer(i, &q.options[0]).unwrap();
        exam.select_answer(i, &q.correct_answer).unwrap();
    }
    assert_eq!(exam.answered(), EXAM_QUESTION_COUNT);

    let result = exam.finish().unwrap().unwrap();
    assert_eq!(result.score, result.total);
}

#[tokio::test]
async fn generation_failure_then_retry_reaches_ready() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 600, t.ctx.clone());

    t.generator.set_fail_exam(true);
    assert_eq!(exam.load_questions().await, FetchOutcome::Failed);
    assert_eq!(exam.phase(), ExamPhase::Error);
    assert!(exam.view().error.is_some());
    assert!(matches!(exam.start(), Err(SessionError::InvalidPhase { .. })));

    t.generator.set_fail_exam(false);
    exam.begin_retry().unwrap();
    assert_eq!(exam.phase(), ExamPhase::NotStarted);
    assert_eq!(exam.load_questions().await, FetchOutcome::Applied);
    assert_eq!(exam.phase(), ExamPhase::Ready);
    assert_eq!(t.generator.exams(), 2);
}

#[tokio::test]
async fn duplicate_question_fetch_is_ignored() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 600, t.ctx.clone());

    t.generator.hold();
    let first = exam.spawn_question_fetch();
    while t.generator.exams() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(exam.load_questions().await, FetchOutcome::Ignored);
    t.generator.release();

    assert_eq!(first.await.unwrap(), FetchOutcome::Applied);
    assert_eq!(t.generator.exams(), 1);
}

#[tokio::test]
async fn rebinding_exam_abandons_previous() {
    let t = session_context(&["ana"]);
    let registry = SessionRegistry::new();

    t.generator.hold();
    let old = registry.open_exam(t.ctx.clone(), "ana", 600);
    let old_id = old.id();
    t.generator.release();
    let new = ExamSession::new("ana", 600, t.ctx.clone());
    registry.bind_exam(new.clone());

    assert!(!old.is_live());
    assert_eq!(registry.exam("ana").unwrap().id(), new.id());
    assert_ne!(old_id, new.id());
    assert!(old.finish().unwrap().is_none());
}

#[tokio::test]
async fn countdown_task_finishes_the_exam() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 1, t.ctx.clone());
    exam.load_questions().await;
    exam.start().unwrap();

    let countdown = exam.spawn_countdown();
    tokio::time::timeout(Duration::from_secs(5), countdown)
        .await
        .expect("countdown should stop after finishing")
        .unwrap();

    assert_eq!(exam.phase(), ExamPhase::Finished);
    assert_eq!(t.ctx.store.exam_history("ana").unwrap().len(), 1);
}

#[tokio::test]
async fn timed_out_exam_is_recorded_by_later_finish_after_store_failure() {
    let t = session_context(&["ana"]);
    let exam = ExamSession::new("ana", 1, t.ctx.clone());
    exam.load_questions().await;
    exam.start().unwrap();
    let user = t.ctx.store.load_user("ana").unwrap().unwrap();
    t.ctx.store.users.remove("ana").unwrap();

    assert!(!exam.tick());
    assert_eq!(exam.phase(), ExamPhase::Finished);
    assert!(!exam.is_recorded());
    assert!(!exam.view().recorded);

    t.ctx.store.create_user(&user).unwrap();
    let result = exam.finish().unwrap().expect("pending result is recorded");
    assert!(exam.is_recorded());
    assert!(exam.finish().unwrap().is_none());
    assert_eq!(t.ctx.store.exam_history("ana").unwrap(), vec![result]);
}
