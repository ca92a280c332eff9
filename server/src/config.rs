// Configuration constants for the server

use std::time::Duration;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Upper bound on the whole multipart upload (text plus speaker files).
    pub max_upload_bytes: usize,
    /// How long a finished archive stays downloadable before eviction.
    pub archive_ttl_secs: u64,
    /// External synthesizer command and its fixed leading arguments.
    pub synth_command: String,
    pub synth_args: Vec<String>,
    pub max_chunk_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            rate_limit_per_minute: 60,
            // Jobs synthesize many chunks at seconds apiece; the request
            // timeout has to cover the whole batch.
            request_timeout_secs: 600,
            cors_allowed_origins: None,
            max_upload_bytes: 50 * 1024 * 1024,
            archive_ttl_secs: 3600,
            synth_command: "xtts-synth".to_string(),
            synth_args: Vec::new(),
            max_chunk_len: cloning_core::DEFAULT_MAX_CHUNK_LEN,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let rate_limit_per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_minute);

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        let archive_ttl_secs = std::env::var("ARCHIVE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.archive_ttl_secs);

        let synth_command =
            std::env::var("SYNTH_COMMAND").unwrap_or_else(|_| defaults.synth_command.clone());

        let synth_args = std::env::var("SYNTH_ARGS")
            .ok()
            .map(|args| args.split_whitespace().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let max_chunk_len = std::env::var("MAX_CHUNK_LEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_chunk_len);

        Self {
            port,
            rate_limit_per_minute,
            request_timeout_secs,
            cors_allowed_origins,
            max_upload_bytes,
            archive_ttl_secs,
            synth_command,
            synth_args,
            max_chunk_len,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn archive_ttl(&self) -> Duration {
        Duration::from_secs(self.archive_ttl_secs)
    }
}
