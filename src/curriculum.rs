use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CEFR proficiency tier. Ordering follows difficulty.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::A1, Level::A2, Level::B1, Level::B2];

    pub fn code(self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Level::A1 => "Beginner",
            Level::A2 => "Elementary",
            Level::B1 => "Intermediate",
            Level::B2 => "Upper intermediate",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level '{}', expected one of A1, A2, B1, B2", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
}

const fn topic(id: &'static str, title: &'static str, emoji: &'static str) -> Topic {
    Topic { id, title, emoji }
}

const A1_TOPICS: &[Topic] = &[
    topic("a1-greetings", "Greetings and introductions", "👋"),
    topic("a1-numbers", "Numbers, prices and time", "🔢"),
    topic("a1-family", "Family and people", "👪"),
    topic("a1-food", "Food and ordering at a café", "🥐"),
    topic("a1-daily-routine", "Daily routine", "⏰"),
    topic("a1-present-tense", "Regular verbs in the present", "📘"),
];

const A2_TOPICS: &[Topic] = &[
    topic("a2-past-events", "Talking about the past", "🕰️"),
    topic("a2-travel", "Travel and directions", "🧭"),
    topic("a2-shopping", "Shopping and clothes", "🛍️"),
    topic("a2-health", "Health and the body", "🩺"),
    topic("a2-weather", "Weather and seasons", "🌦️"),
    topic("a2-comparisons", "Making comparisons", "⚖️"),
];

const B1_TOPICS: &[Topic] = &[
    topic("b1-future-plans", "Plans and predictions", "🔮"),
    topic("b1-work", "Work and careers", "💼"),
    topic("b1-opinions", "Giving opinions", "💬"),
    topic("b1-conditionals", "Real and unreal conditions", "🔀"),
    topic("b1-media", "News and media", "📰"),
    topic("b1-environment", "Environment and nature", "🌱"),
];

const B2_TOPICS: &[Topic] = &[
    topic("b2-subjunctive", "Wishes, doubts and the subjunctive", "🎭"),
    topic("b2-reported-speech", "Reported speech", "🗣️"),
    topic("b2-culture", "Culture and traditions", "🏛️"),
    topic("b2-technology", "Technology and society", "🤖"),
    topic("b2-argument", "Building an argument", "🧩"),
    topic("b2-idioms", "Idioms and colloquial speech", "🦜"),
];

pub fn topics_for(level: Level) -> &'static [Topic] {
    match level {
        Level::A1 => A1_TOPICS,
        Level::A2 => A2_TOPICS,
        Level::B1 => B1_TOPICS,
        Level::B2 => B2_TOPICS,
    }
}

pub fn find_topic(level: Level, topic_id: &str) -> Option<Topic> {
    topics_for(level).iter().find(|t| t.id == topic_id).copied()
}

/// Looks a topic up across every level.
pub fn locate_topic(topic_id: &str) -> Option<(Level, Topic)> {
    Level::ALL
        .iter()
        .find_map(|level| find_topic(*level, topic_id).map(|t| (*level, t)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(Level::A1 < Level::A2);
        assert!(Level::B1 < Level::B2);
        let mut shuffled = vec![Level::B2, Level::A1, Level::B1, Level::A2];
        shuffled.sort();
        assert_eq!(shuffled, Level::ALL.to_vec());
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("b1".parse::<Level>().unwrap(), Level::B1);
        assert_eq!(" A2 ".parse::<Level>().unwrap(), Level::A2);
        assert!("C1".parse::<Level>().is_err());
    }

    #[test]
    fn level_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Level::B2).unwrap(), "\"B2\"");
        let parsed: Level = serde_json::from_str("\"A1\"").unwrap();
        assert_eq!(parsed, Level::A1);
    }

    #[test]
    fn topic_ids_are_unique_across_levels() {
        let mut seen = HashSet::new();
        for level in Level::ALL {
            assert!(!topics_for(level).is_empty());
            for topic in topics_for(level) {
                assert!(seen.insert(topic.id), "duplicate topic id {}", topic.id);
            }
        }
    }

    #[test]
    fn find_topic_respects_level() {
        assert!(find_topic(Level::A1, "a1-food").is_some());
        assert!(find_topic(Level::B2, "a1-food").is_none());
        assert_eq!(locate_topic("b2-idioms").map(|(l, _)| l), Some(Level::B2));
        assert!(locate_topic("nope").is_none());
    }
}
