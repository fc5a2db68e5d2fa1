use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

use crate::constants::{DEFAULT_EXAM_DURATION_SECS, DEFAULT_NATIVE_LANGUAGE, DEFAULT_TARGET_LANGUAGE};

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub static_dir: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: u64,
    pub cors_origin: String,
    pub languages: LanguageConfig,
    pub exam: ExamConfig,
    pub llm: LLMConfig,
}

/// The language being learned and the language explanations are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    pub target: String,
    pub native: String,
}

#[derive(Debug, Clone)]
pub struct ExamConfig {
    pub duration_secs: u64,
}

#[derive(Clone)]
pub struct LLMConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("static_dir", &self.static_dir)
            .field("jwt_secret", &"***REDACTED***")
            .field("jwt_expires_in_hours", &self.jwt_expires_in_hours)
            .field("cors_origin", &self.cors_origin)
            .field("languages", &self.languages)
            .field("exam", &self.exam)
            .field("llm", &self.llm)
            .finish()
    }
}

impl fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LLMConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET_LANGUAGE.to_string(),
            native: DEFAULT_NATIVE_LANGUAGE.to_string(),
        }
    }
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_EXAM_DURATION_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/lingo-tutor.sled"),
            static_dir: env_or("STATIC_DIR", "static"),
            jwt_secret: env_or(
                "JWT_SECRET",
                "change_me_to_random_64_chars_change_me_to_random_64_chars",
            ),
            jwt_expires_in_hours: env_or_parse("JWT_EXPIRES_IN_HOURS", 24 * 30_u64),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            languages: LanguageConfig {
                target: env_or("TARGET_LANGUAGE", DEFAULT_TARGET_LANGUAGE),
                native: env_or("NATIVE_LANGUAGE", DEFAULT_NATIVE_LANGUAGE),
            },
            exam: ExamConfig {
                duration_secs: env_or_parse("EXAM_DURATION_SECS", DEFAULT_EXAM_DURATION_SECS).max(1),
            },
            llm: LLMConfig {
                enabled: env_or_bool("LLM_ENABLED", false),
                mock: env_or_bool("LLM_MOCK", true),
                api_url: env_or("LLM_API_URL", "https://api.openai.com/v1"),
                api_key: env_or("LLM_API_KEY", ""),
                model: env_or("LLM_MODEL", "gpt-4o-mini"),
                timeout_secs: env_or_parse("LLM_TIMEOUT_SECS", 60_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "TARGET_LANGUAGE",
            "NATIVE_LANGUAGE",
            "EXAM_DURATION_SECS",
            "LLM_ENABLED",
            "LLM_TIMEOUT_SECS",
            "LLM_MOCK",
            "LLM_API_KEY",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.exam.duration_secs, 1800);
        assert_eq!(cfg.languages, LanguageConfig::default());
        assert!(!cfg.llm.enabled);
        assert!(cfg.llm.mock);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("EXAM_DURATION_SECS", "600");
        env::set_var("LLM_TIMEOUT_SECS", "42");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.exam.duration_secs, 600);
        assert_eq!(cfg.llm.timeout_secs, 42);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("EXAM_DURATION_SECS", "soon");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.exam.duration_secs, 1800);
    }

    #[test]
    fn zero_exam_duration_is_clamped() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("EXAM_DURATION_SECS", "0");

        let cfg = Config::from_env();
        assert_eq!(cfg.exam.duration_secs, 1);
    }

    #[test]
    fn language_pair_overrides() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("TARGET_LANGUAGE", "German");
        env::set_var("NATIVE_LANGUAGE", "Polish");

        let cfg = Config::from_env();
        assert_eq!(cfg.languages.target, "German");
        assert_eq!(cfg.languages.native, "Polish");
    }

    #[test]
    fn debug_redacts_secrets() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("LLM_API_KEY", "sk-very-secret");

        let cfg = Config::from_env();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("REDACTED"));
    }
}
