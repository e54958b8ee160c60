use std::time::Duration;
use thiserror::Error;

/// 邮件监视器错误类型
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Load error: {0}")]
    Load(String),

    #[error("No data returned for message uid={0}")]
    MessageNotFound(u32),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Mailbox identity changed: uidvalidity {expected} -> {actual}")]
    MailboxIdentityChanged { expected: u32, actual: u32 },

    #[error("Monitoring timed out after {0:?}")]
    MonitoringTimeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 库级别通用 Result 类型
pub type MailResult<T> = Result<T, MailError>;
