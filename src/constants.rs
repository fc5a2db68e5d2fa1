/// Upper bound on compare-and-swap retries for a single record.
pub const MAX_CAS_RETRIES: u32 = 20;

/// Number of questions in the placement exam.
pub const EXAM_QUESTION_COUNT: usize = 25;

/// Default exam countdown (30 minutes).
pub const DEFAULT_EXAM_DURATION_SECS: u64 = 30 * 60;

/// Countdown tick period.
pub const EXAM_TICK_SECS: u64 = 1;

/// Longest free-text task answer, in characters.
pub const MAX_TASK_ANSWER_CHARS: usize = 4_000;

/// Longest vocabulary entry, in characters.
pub const MAX_VOCABULARY_WORD_CHARS: usize = 200;

/// Avatar is a short emoji or initials string.
pub const MAX_AVATAR_CHARS: usize = 16;

/// Fewest options a generated quiz question may carry.
pub const MIN_QUIZ_OPTIONS: usize = 2;

pub const DEFAULT_TARGET_LANGUAGE: &str = "Spanish";

pub const DEFAULT_NATIVE_LANGUAGE: &str = "English";

/// How often expired login sessions are purged.
pub const SESSION_CLEANUP_INTERVAL_SECS: u64 = 60 * 60;
