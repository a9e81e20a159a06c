//! Environment configuration
//!
//! Loaded from the process environment, with a `.env` discovered beside the
//! executable first (packaged deployments) and in the working directory
//! second. The classifier variables are hard requirements; the email
//! variables are optional and merely disable admin alerts when absent.

use std::path::PathBuf;

use tracing::{debug, warn};

pub const DEFAULT_SMTP_RELAY: &str = "smtp.office365.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub relay: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub email: Option<EmailConfig>,
}

/// Load configuration, reading `.env` files first. Fatal when the
/// classifier endpoint/key/model are not present.
pub fn load() -> Result<AgentConfig, ConfigError> {
    if let Some(path) = dotenv_path() {
        debug!(path = %path.display(), "loading .env");
        let _ = dotenvy::from_path(&path);
    }

    let llm = LlmConfig {
        endpoint: require("AZURE_INFERENCE_ENDPOINT")?,
        api_key: require("AZURE_INFERENCE_KEY")?,
        model: require("AZURE_INFERENCE_MODEL")?,
    };

    let email = email_config();
    if email.is_none() {
        warn!("email configuration incomplete, admin alerts disabled");
    }

    Ok(AgentConfig { llm, email })
}

/// Email-only view for the git-hook helper paths, which must not require
/// the classifier configuration.
pub fn load_email() -> Option<EmailConfig> {
    if let Some(path) = dotenv_path() {
        let _ = dotenvy::from_path(&path);
    }
    email_config()
}

fn dotenv_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let beside_exe = dir.join(".env");
            if beside_exe.exists() {
                return Some(beside_exe);
            }
        }
    }
    let cwd = PathBuf::from(".env");
    cwd.exists().then_some(cwd)
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn email_config() -> Option<EmailConfig> {
    Some(EmailConfig {
        sender: optional("EMAIL_SENDER")?,
        password: optional("EMAIL_PASSWORD")?,
        receiver: optional("EMAIL_RECEIVER")?,
        relay: optional("SMTP_RELAY").unwrap_or_else(|| DEFAULT_SMTP_RELAY.to_owned()),
        port: optional("SMTP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "AZURE_INFERENCE_ENDPOINT",
            "AZURE_INFERENCE_KEY",
            "AZURE_INFERENCE_MODEL",
            "EMAIL_SENDER",
            "EMAIL_PASSWORD",
            "EMAIL_RECEIVER",
            "SMTP_RELAY",
            "SMTP_PORT",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn missing_llm_config_is_fatal() {
        clear_env();
        let err = load().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("AZURE_INFERENCE_ENDPOINT")));
    }

    #[test]
    #[serial]
    fn email_is_optional() {
        clear_env();
        std::env::set_var("AZURE_INFERENCE_ENDPOINT", "https://llm.example");
        std::env::set_var("AZURE_INFERENCE_KEY", "k");
        std::env::set_var("AZURE_INFERENCE_MODEL", "gpt-4o-mini");

        let config = load().unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.email.is_none());
    }

    #[test]
    #[serial]
    fn complete_email_config_defaults_the_relay() {
        clear_env();
        std::env::set_var("AZURE_INFERENCE_ENDPOINT", "https://llm.example");
        std::env::set_var("AZURE_INFERENCE_KEY", "k");
        std::env::set_var("AZURE_INFERENCE_MODEL", "m");
        std::env::set_var("EMAIL_SENDER", "dlp@corp.example");
        std::env::set_var("EMAIL_PASSWORD", "hunter2");
        std::env::set_var("EMAIL_RECEIVER", "soc@corp.example");

        let email = load().unwrap().email.unwrap();
        assert_eq!(email.relay, DEFAULT_SMTP_RELAY);
        assert_eq!(email.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    #[serial]
    fn blank_values_count_as_missing() {
        clear_env();
        std::env::set_var("AZURE_INFERENCE_ENDPOINT", "  ");
        let err = load().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("AZURE_INFERENCE_ENDPOINT")));
    }
}
