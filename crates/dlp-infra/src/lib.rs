//! # dlp-infra
//!
//! Infrastructure for the DLP agent: environment configuration, the remote
//! LLM classifier client, the SMTP alert mailer and the tracing bootstrap.

pub mod classifier;
pub mod config;
pub mod logging;
pub mod mailer;

pub use classifier::LlmClassifier;
pub use config::{AgentConfig, ConfigError, EmailConfig, LlmConfig};
pub use mailer::AlertMailer;
