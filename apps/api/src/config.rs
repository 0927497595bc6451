use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub jobs_file: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Size of the background worker pool scoring resumes.
    pub worker_count: usize,
    /// Seconds a terminal task is kept before the retention sweep removes it.
    pub task_retention_secs: u64,
    /// Upload size ceiling for resume files, in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            jobs_file: require_env("JOBS_FILE")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            worker_count: env_or("WORKER_COUNT", "4")
                .parse::<usize>()
                .context("WORKER_COUNT must be a positive integer")?,
            task_retention_secs: env_or("TASK_RETENTION_SECS", "600")
                .parse::<u64>()
                .context("TASK_RETENTION_SECS must be a number of seconds")?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "5242880")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
