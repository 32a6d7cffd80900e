// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration for the PDF question-answering node
//!
//! Values are read from the process environment (optionally seeded from a
//! `.env` file by the binary). Credentials are mandatory and checked up
//! front so a missing key fails at startup instead of on the first query.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::rag::chunker::ChunkingConfig;

/// Environment variable holding the inference provider key
pub const LLM_API_KEY_VAR: &str = "GROQ_API_KEY";
/// Environment variable holding the embedding/inference ecosystem key
pub const SUPPORT_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_MODEL_PATH: &str = "./models/all-MiniLM-L6-v2-onnx/model.onnx";
pub const DEFAULT_EMBEDDING_TOKENIZER_PATH: &str =
    "./models/all-MiniLM-L6-v2-onnx/tokenizer.json";
pub const DEFAULT_LLM_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1";
/// No value is given upstream; 30s covers a long 70B completion
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_PORT: u16 = 8080;

/// Configuration errors, raised before any work is done
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A required credential is not set or is blank
    #[error("Missing credential: set {var} in the environment or .env file")]
    MissingCredential { var: String },

    /// An environment value could not be parsed
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },

    /// Values parsed but violate an invariant
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            ConfigError::InvalidValue { .. } => "INVALID_CONFIG_VALUE",
            ConfigError::Invalid(_) => "INVALID_CONFIG",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ConfigError::MissingCredential { var } => {
                format!("{} is not set. Add it to your environment or .env file.", var)
            }
            _ => self.to_string(),
        }
    }
}

/// Embedding model location and identity
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub model_name: String,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub batch_size: usize,
}

/// Secret value that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Remote chat-completion endpoint settings
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_url: String,
    pub api_key: Credential,
    pub model: String,
    pub timeout: Duration,
}

/// Full node configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory scanned for `*.pdf` files
    pub data_dir: PathBuf,
    pub chunking: ChunkingConfig,
    /// Number of chunks retrieved per question
    pub top_k: usize,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    /// Key for the embedding/inference support ecosystem. Only checked for
    /// presence; nothing in this node sends it anywhere.
    pub support_api_key: Credential,
    pub api_host: String,
    pub api_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_api_key = required_credential(LLM_API_KEY_VAR)?;
        let support_api_key = required_credential(SUPPORT_API_KEY_VAR)?;

        let config = Self {
            data_dir: PathBuf::from(
                env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
            ),
            chunking: ChunkingConfig {
                chunk_size: parse_var("CHUNK_SIZE", ChunkingConfig::default().chunk_size)?,
                chunk_overlap: parse_var(
                    "CHUNK_OVERLAP",
                    ChunkingConfig::default().chunk_overlap,
                )?,
            },
            top_k: parse_var("TOP_K", DEFAULT_TOP_K)?,
            embedding: EmbeddingSettings {
                model_name: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
                model_path: PathBuf::from(
                    env::var("EMBEDDING_MODEL_PATH")
                        .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL_PATH.to_string()),
                ),
                tokenizer_path: PathBuf::from(
                    env::var("EMBEDDING_TOKENIZER_PATH")
                        .unwrap_or_else(|_| DEFAULT_EMBEDDING_TOKENIZER_PATH.to_string()),
                ),
                batch_size: parse_var("EMBED_BATCH_SIZE", DEFAULT_EMBED_BATCH_SIZE)?,
            },
            llm: LlmSettings {
                api_url: env::var("LLM_API_URL")
                    .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
                api_key: llm_api_key,
                model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
                timeout: Duration::from_secs(parse_var(
                    "LLM_TIMEOUT_SECS",
                    DEFAULT_LLM_TIMEOUT_SECS,
                )?),
            },
            support_api_key,
            api_host: env::var("API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string()),
            api_port: parse_var("API_PORT", DEFAULT_API_PORT)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration with defaults and the given credentials, for tests and
    /// embedding the service in other programs
    pub fn with_credentials(
        llm_api_key: impl Into<String>,
        support_api_key: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            embedding: EmbeddingSettings {
                model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
                model_path: PathBuf::from(DEFAULT_EMBEDDING_MODEL_PATH),
                tokenizer_path: PathBuf::from(DEFAULT_EMBEDDING_TOKENIZER_PATH),
                batch_size: DEFAULT_EMBED_BATCH_SIZE,
            },
            llm: LlmSettings {
                api_url: DEFAULT_LLM_API_URL.to_string(),
                api_key: Credential::new(llm_api_key),
                model: DEFAULT_LLM_MODEL.to_string(),
                timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            },
            support_api_key: Credential::new(support_api_key),
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate().map_err(ConfigError::Invalid)?;
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("TOP_K must be greater than 0".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "EMBED_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }
        if self.llm.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "LLM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        if self.llm.api_key.is_blank() {
            return Err(ConfigError::MissingCredential {
                var: LLM_API_KEY_VAR.to_string(),
            });
        }
        if self.support_api_key.is_blank() {
            return Err(ConfigError::MissingCredential {
                var: SUPPORT_API_KEY_VAR.to_string(),
            });
        }
        Ok(())
    }
}

fn required_credential(var: &str) -> Result<Credential, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(Credential::new(value)),
        _ => Err(ConfigError::MissingCredential {
            var: var.to_string(),
        }),
    }
}

fn parse_var<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
