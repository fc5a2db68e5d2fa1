use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use lingo_tutor::config::{Config, ExamConfig, LLMConfig, LanguageConfig};
use lingo_tutor::curriculum::Level;
use lingo_tutor::routes::build_router;
use lingo_tutor::services::content_cache::ContentCache;
use lingo_tutor::session::SessionContext;
use lingo_tutor::state::AppState;
use lingo_tutor::store::operations::users::User;
use lingo_tutor::store::Store;

use super::generator::ScriptedGenerator;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub generator: Arc<ScriptedGenerator>,
    _temp_dir: TempDir,
}

fn test_config(temp_dir: &TempDir, exam_duration_secs: u64) -> Config {
    let sled_path = temp_dir.path().join("lingo-test.sled");
    // Built directly: set_var would race between parallel tests.
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        static_dir: temp_dir.path().join("static").to_string_lossy().to_string(),
        jwt_secret: format!("integration-test-jwt-secret-{}", uuid::Uuid::new_v4()),
        jwt_expires_in_hours: 24,
        cors_origin: "http://localhost:5173".to_string(),
        languages: LanguageConfig::default(),
        exam: ExamConfig {
            duration_secs: exam_duration_secs,
        },
        llm: LLMConfig {
            enabled: false,
            mock: true,
            api_url: String::new(),
            api_key: String::new(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        },
    }
}

pub async fn spawn_test_app_with_exam_duration(exam_duration_secs: u64) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&temp_dir, exam_duration_secs);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let generator = Arc::new(ScriptedGenerator::new());
    let state = AppState::new(store, generator.clone(), &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        generator,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_with_exam_duration(1800).await
}

/// Session-layer fixture without the HTTP surface.
pub struct TestContext {
    pub ctx: SessionContext,
    pub generator: Arc<ScriptedGenerator>,
    _temp_dir: TempDir,
}

pub fn session_context(usernames: &[&str]) -> TestContext {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(temp_dir.path().join("session.sled").to_str().unwrap())
        .expect("open store");
    store.run_migrations().expect("run migrations");
    for name in usernames {
        store
            .create_user(&User::new(name, "unused-hash".to_string(), Level::A1))
            .expect("seed user");
    }

    let generator = Arc::new(ScriptedGenerator::new());
    TestContext {
        ctx: SessionContext {
            store: Arc::new(store),
            cache: Arc::new(ContentCache::new()),
            generator: generator.clone(),
        },
        generator,
        _temp_dir: temp_dir,
    }
}
