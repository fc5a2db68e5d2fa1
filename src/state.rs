use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::services::content_cache::ContentCache;
use crate::services::generator::ContentGenerator;
use crate::session::registry::SessionRegistry;
use crate::session::SessionContext;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    cache: Arc<ContentCache>,
    generator: Arc<dyn ContentGenerator>,
    sessions: Arc<SessionRegistry>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, generator: Arc<dyn ContentGenerator>, config: &Config) -> Self {
        Self {
            store,
            cache: Arc::new(ContentCache::new()),
            generator,
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles a new topic session or exam is built from.
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            store: self.store.clone(),
            cache: self.cache.clone(),
            generator: self.generator.clone(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
