use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_resume_bytes: usize,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Transactional mail relay endpoint. When unset, mails are only logged.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub hr_inbox: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5)?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3296)?;
        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let max_resume_bytes = parse_var("MAX_RESUME_BYTES", DEFAULT_MAX_RESUME_BYTES)?;

        let mail = MailConfig {
            api_url: env::var("MAIL_API_URL").ok().filter(|s| !s.trim().is_empty()),
            api_key: env::var("MAIL_API_KEY").ok().filter(|s| !s.trim().is_empty()),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@careerdesk.local".to_string()),
            hr_inbox: env::var("HR_INBOX").unwrap_or_else(|_| "hr@careerdesk.local".to_string()),
        };

        debug!("Upload directory: {}", upload_dir.display());
        debug!("Mail relay configured: {}", mail.api_url.is_some());

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            upload_dir,
            max_upload_bytes,
            max_resume_bytes,
            mail,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
