use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::content::{ComprehensivePractice, ContentKind, LessonContent};
use crate::curriculum::{Level, Topic};
use crate::services::generator::{ContentGenerator, GenerationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub level: Level,
    pub topic_id: &'static str,
    pub kind: ContentKind,
}

impl CacheKey {
    pub fn new(level: Level, topic: &Topic, kind: ContentKind) -> Self {
        Self {
            level,
            topic_id: topic.id,
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedContent {
    Lesson(Arc<LessonContent>),
    Practice(Arc<ComprehensivePractice>),
}

/// Process-lifetime memo of generated lessons and practice sessions.
///
/// No eviction. Two concurrent misses on one key may both reach the
/// generator; the later `put` wins and both callers get equivalent content.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: RwLock<HashMap<CacheKey, CachedContent>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedContent> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: CacheKey, content: CachedContent) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, content);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lesson(&self, level: Level, topic: &Topic) -> Option<Arc<LessonContent>> {
        match self.get(&CacheKey::new(level, topic, ContentKind::Lesson)) {
            Some(CachedContent::Lesson(lesson)) => Some(lesson),
            _ => None,
        }
    }

    pub fn practice(&self, level: Level, topic: &Topic) -> Option<Arc<ComprehensivePractice>> {
        match self.get(&CacheKey::new(level, topic, ContentKind::Practice)) {
            Some(CachedContent::Practice(practice)) => Some(practice),
            _ => None,
        }
    }

    /// Read-through lesson fetch.
    pub async fn lesson_or_fetch(
        &self,
        generator: &dyn ContentGenerator,
        level: Level,
        topic: Topic,
    ) -> GenerationResult<Arc<LessonContent>> {
        if let Some(hit) = self.lesson(level, &topic) {
            tracing::debug!(%level, topic = topic.id, "Lesson cache hit");
            return Ok(hit);
        }
        let lesson = Arc::new(generator.fetch_lesson(level, topic).await?);
        self.put(
            CacheKey::new(level, &topic, ContentKind::Lesson),
            CachedContent::Lesson(lesson.clone()),
        );
        Ok(lesson)
    }

    /// Read-through practice fetch. `refresh` skips the lookup and replaces
    /// whatever was cached.
    pub async fn practice_or_fetch(
        &self,
        generator: &dyn ContentGenerator,
        level: Level,
        topic: Topic,
        refresh: bool,
    ) -> GenerationResult<Arc<ComprehensivePractice>> {
        if !refresh {
            if let Some(hit) = self.practice(level, &topic) {
                tracing::debug!(%level, topic = topic.id, "Practice cache hit");
                return Ok(hit);
            }
        }
        let practice = Arc::new(generator.fetch_practice(level, topic).await?);
        self.put(
            CacheKey::new(level, &topic, ContentKind::Practice),
            CachedContent::Practice(practice.clone()),
        );
        Ok(practice)
    }
}
