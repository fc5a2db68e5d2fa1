use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Lesson,
    Practice,
}

/// Per-user, per-topic completion state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    #[serde(default)]
    pub completed_vocabulary: BTreeSet<String>,
    #[serde(default)]
    pub completed_sections: BTreeSet<Section>,
}

/// Partial change pushed to the progress store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Unioned into the stored sections.
    pub add_sections: BTreeSet<Section>,
    /// Full replacement of the stored vocabulary when present.
    pub completed_vocabulary: Option<BTreeSet<String>>,
}

impl ProgressUpdate {
    pub fn complete_section(section: Section) -> Self {
        Self {
            add_sections: BTreeSet::from([section]),
            completed_vocabulary: None,
        }
    }

    pub fn replace_vocabulary(words: BTreeSet<String>) -> Self {
        Self {
            add_sections: BTreeSet::new(),
            completed_vocabulary: Some(words),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add_sections.is_empty() && self.completed_vocabulary.is_none()
    }
}

impl TopicProgress {
    /// Both the lesson and the practice have been completed.
    pub fn is_complete(&self) -> bool {
        self.has_section(Section::Lesson) && self.has_section(Section::Practice)
    }

    pub fn has_section(&self, section: Section) -> bool {
        self.completed_sections.contains(&section)
    }

    /// The vocabulary set after toggling `word`: removed if present, added otherwise.
    pub fn toggled_vocabulary(&self, word: &str) -> BTreeSet<String> {
        let mut next = self.completed_vocabulary.clone();
        if !next.remove(word) {
            next.insert(word.to_string());
        }
        next
    }

    pub fn merged(&self, update: &ProgressUpdate) -> TopicProgress {
        let mut next = self.clone();
        next.completed_sections
            .extend(update.add_sections.iter().copied());
        if let Some(words) = &update.completed_vocabulary {
            next.completed_vocabulary = words.clone();
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_requires_both_sections() {
        let mut progress = TopicProgress::default();
        assert!(!progress.is_complete());
        progress = progress.merged(&ProgressUpdate::complete_section(Section::Lesson));
        assert!(!progress.is_complete());
        progress = progress.merged(&ProgressUpdate::complete_section(Section::Practice));
        assert!(progress.is_complete());
    }

    #[test]
    fn completing_twice_changes_nothing() {
        let words = BTreeSet::from(["casa".to_string()]);
        let base = TopicProgress::default()
            .merged(&ProgressUpdate::replace_vocabulary(words))
            .merged(&ProgressUpdate::complete_section(Section::Lesson));
        let again = base.merged(&ProgressUpdate::complete_section(Section::Lesson));
        assert_eq!(again, base);
        assert_eq!(again.completed_sections.len(), 1);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let progress = TopicProgress::default();
        let added = progress.toggled_vocabulary("perro");
        assert!(added.contains("perro"));
        let back = TopicProgress {
            completed_vocabulary: added,
            ..TopicProgress::default()
        }
        .toggled_vocabulary("perro");
        assert!(back.is_empty());
    }

    #[test]
    fn sections_serialize_lowercase() {
        let progress = TopicProgress::default()
            .merged(&ProgressUpdate::complete_section(Section::Practice));
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["completedSections"], serde_json::json!(["practice"]));
        assert_eq!(value["completedVocabulary"], serde_json::json!([]));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ProgressUpdate::default().is_empty());
        assert!(!ProgressUpdate::complete_section(Section::Lesson).is_empty());
    }
}
