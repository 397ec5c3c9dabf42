use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for TableTalk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub chat: ChatConfig,
    pub inference: InferenceConfig,
    pub voice: VoiceConfig,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes
    pub max_file_bytes: usize,
    /// Number of rows shown in the prompt preview
    pub preview_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum number of conversation turns kept in the session log
    pub max_history: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: i32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Command invoked for text-to-speech playback; the text is passed as the
    /// final argument. None disables playback entirely.
    pub tts_command: Option<String>,
    /// Command invoked for speech capture; expected to print the transcript
    /// on stdout. None reports the speech service as unavailable.
    pub stt_command: Option<String>,
    /// Seconds to wait for speech before giving up
    pub listen_timeout_seconds: u64,
    /// Upper bound on utterance length in seconds, passed to the capture command
    pub phrase_time_limit_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Append-only log file for user feedback
    pub log_path: String,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        // Load environment variables from .env files
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!(
                "No .env file found in any expected location - continuing with env vars only"
            );
        }

        // Default config path
        let config_path =
            env::var("TABLETALK_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        // Load config from file if it exists
        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(name) = env::var("TABLETALK_SERVER_NAME") {
            self.server.name = name;
        }
        if let Ok(bind) = env::var("TABLETALK_BIND") {
            self.server.bind = bind;
        }

        // Upload overrides
        if let Ok(max_bytes) = env::var("TABLETALK_MAX_FILE_BYTES") {
            if let Ok(max) = max_bytes.parse() {
                self.upload.max_file_bytes = max;
            }
        }
        if let Ok(rows) = env::var("TABLETALK_PREVIEW_ROWS") {
            if let Ok(n) = rows.parse() {
                self.upload.preview_rows = n;
            }
        }

        // Chat overrides
        if let Ok(max_history) = env::var("TABLETALK_MAX_HISTORY") {
            if let Ok(max) = max_history.parse() {
                self.chat.max_history = max;
            }
        }

        // Inference overrides
        if let Ok(api_key) = env::var("HF_API_TOKEN") {
            self.inference.api_key = api_key;
        }
        if let Ok(base_url) = env::var("TABLETALK_INFERENCE_URL") {
            self.inference.base_url = base_url;
        }
        if let Ok(model) = env::var("TABLETALK_MODEL") {
            self.inference.model = model;
        }
        if let Ok(max_tokens) = env::var("TABLETALK_MAX_TOKENS") {
            if let Ok(max) = max_tokens.parse() {
                self.inference.max_tokens = max;
            }
        }
        if let Ok(temperature) = env::var("TABLETALK_TEMPERATURE") {
            if let Ok(t) = temperature.parse() {
                self.inference.temperature = t;
            }
        }

        // Voice overrides
        if let Ok(cmd) = env::var("TABLETALK_TTS_COMMAND") {
            self.voice.tts_command = Some(cmd);
        }
        if let Ok(cmd) = env::var("TABLETALK_STT_COMMAND") {
            self.voice.stt_command = Some(cmd);
        }
        if let Ok(timeout) = env::var("TABLETALK_LISTEN_TIMEOUT_SECONDS") {
            if let Ok(secs) = timeout.parse() {
                self.voice.listen_timeout_seconds = secs;
            }
        }

        // Feedback overrides
        if let Ok(path) = env::var("TABLETALK_FEEDBACK_LOG") {
            self.feedback.log_path = path;
        }
    }

    /// Validate configuration
    fn validate(&self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        if self.upload.max_file_bytes == 0 {
            return Err("Upload max_file_bytes cannot be 0".into());
        }
        if self.upload.preview_rows == 0 {
            return Err("Upload preview_rows cannot be 0".into());
        }

        if self.chat.max_history == 0 {
            return Err("Chat max_history cannot be 0".into());
        }

        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err("Inference temperature must be between 0.0 and 2.0".into());
        }
        if self.inference.max_tokens <= 0 {
            return Err("Inference max_tokens must be positive".into());
        }
        if self.inference.api_key == "PLACEHOLDER_HF_API_TOKEN" || self.inference.api_key.is_empty()
        {
            return Err("HF_API_TOKEN environment variable must be set".into());
        }

        if self.voice.listen_timeout_seconds == 0 {
            return Err("Voice listen_timeout_seconds cannot be 0".into());
        }

        Ok(())
    }

    /// Get speech capture timeout as Duration
    pub fn get_listen_timeout(&self) -> Duration {
        Duration::from_secs(self.voice.listen_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "tabletalk".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                bind: "127.0.0.1:8788".to_string(),
            },
            upload: UploadConfig {
                max_file_bytes: 10 * 1024 * 1024,
                preview_rows: 5,
            },
            chat: ChatConfig { max_history: 50 },
            inference: InferenceConfig {
                api_key: env::var("HF_API_TOKEN").unwrap_or_else(|_| {
                    tracing::warn!("HF_API_TOKEN not set, using placeholder");
                    "PLACEHOLDER_HF_API_TOKEN".to_string()
                }),
                base_url: "https://router.huggingface.co/v1".to_string(),
                model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
                max_tokens: 1500,
                temperature: 0.7,
            },
            voice: VoiceConfig {
                tts_command: None,
                stt_command: None,
                listen_timeout_seconds: 10,
                phrase_time_limit_seconds: 5,
            },
            feedback: FeedbackConfig {
                log_path: "feedback.log".to_string(),
            },
        }
    }
}
