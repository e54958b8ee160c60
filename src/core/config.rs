use crate::core::error::{MailError, MailResult};
use std::time::Duration;
use tracing::warn;

/// 邮箱连接配置
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub mailbox: String,
}

impl ConnectionConfig {
    /// 从.env文件创建配置
    pub fn from_env() -> MailResult<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            host: Self::env_required("MAIL_IMAP_HOST")?,
            port: Self::env_parse("MAIL_IMAP_PORT", 993)?,
            username: Self::env_required("MAIL_USERNAME")?,
            password: Self::env_required("MAIL_PASSWORD")?,
            connect_timeout: Duration::from_secs(Self::env_parse("MAIL_CONNECT_TIMEOUT", 10)?),
            mailbox: Self::env_or("MAIL_MAILBOX", "INBOX"),
        };

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> MailResult<()> {
        if self.host.is_empty() {
            return Err(MailError::Config("IMAP host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(MailError::Config(format!("Invalid IMAP port: {}", self.port)));
        }
        if self.username.is_empty() {
            return Err(MailError::Config("Username cannot be empty".to_string()));
        }
        if self.mailbox.is_empty() {
            return Err(MailError::Config("Mailbox name cannot be empty".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(MailError::Config(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout > Duration::from_secs(300) {
            warn!(
                "Connect timeout {:?} is very long (>5 minutes), is this intended?",
                self.connect_timeout
            );
        }
        Ok(())
    }

    /// 读取环境变量或使用默认值
    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// 读取并解析环境变量，失败时使用默认值
    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> MailResult<T>
    where
        T::Err: std::fmt::Display,
    {
        match std::env::var(key) {
            Ok(val) => val
                .parse()
                .map_err(|e| MailError::Config(format!("Invalid {}: {}", key, e))),
            Err(_) => Ok(default),
        }
    }

    /// 读取必需的环境变量
    fn env_required(key: &str) -> MailResult<String> {
        std::env::var(key).map_err(|_| MailError::Config(format!("{} not set in .env file", key)))
    }
}
