//! Input checks shared by the auth, profile and session routes.

use crate::constants::{MAX_AVATAR_CHARS, MAX_TASK_ANSWER_CHARS, MAX_VOCABULARY_WORD_CHARS};

/// At least 8 and at most 256 bytes, with an upper-case letter, a lower-case
/// letter and a digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if password.len() > 256 {
        return Err("Password must be at most 256 characters long");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_upper || !has_lower || !has_digit {
        return Err("Password must contain an upper-case letter, a lower-case letter and a digit");
    }
    Ok(())
}

/// 2-50 characters: letters, digits, underscore, hyphen and space.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let trimmed = username.trim();
    let char_count = trimmed.chars().count();
    if !(2..=50).contains(&char_count) {
        return Err("Username must be between 2 and 50 characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err("Username may only contain letters, digits, underscores, hyphens and spaces");
    }
    Ok(())
}

/// An avatar is a short emoji or label.
pub fn validate_avatar(avatar: &str) -> Result<(), &'static str> {
    let count = avatar.trim().chars().count();
    if count == 0 {
        return Err("Avatar must not be empty");
    }
    if count > MAX_AVATAR_CHARS {
        return Err("Avatar is too long");
    }
    Ok(())
}

pub fn validate_vocabulary_word(word: &str) -> Result<(), &'static str> {
    if word.trim().is_empty() {
        return Err("Word must not be empty");
    }
    if word.chars().count() > MAX_VOCABULARY_WORD_CHARS {
        return Err("Word is too long");
    }
    Ok(())
}

/// Blank answers are rejected by the session itself; this only bounds size.
pub fn validate_task_answer(answer: &str) -> Result<(), &'static str> {
    if answer.chars().count() > MAX_TASK_ANSWER_CHARS {
        return Err("Answer is too long");
    }
    Ok(())
}
