use super::{MailboxSession, RawMail, SearchCriterion};
use crate::core::config::ConnectionConfig;
use crate::core::error::{MailError, MailResult};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tracing::{info, warn};

pub type ImapSession = async_imap::Session<tokio_native_tls::TlsStream<TcpStream>>;

/// IMAP over TLS 会话
pub struct ImapTlsSession {
    config: ConnectionConfig,
    session: ImapSession,
    uid_validity: Option<u32>,
}

impl ImapTlsSession {
    /// 连接服务器、登录并选择目标邮箱
    pub async fn connect(config: ConnectionConfig) -> MailResult<Self> {
        info!("Connecting to IMAP server {}:{}", config.host, config.port);

        let tcp_stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| {
            MailError::Connect(format!(
                "connect to {}:{} timed out after {:?}",
                config.host, config.port, config.connect_timeout
            ))
        })?
        .map_err(|e| {
            MailError::Connect(format!(
                "tcp connect to {}:{} failed: {}",
                config.host, config.port, e
            ))
        })?;

        let native_tls = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| MailError::Connect(format!("failed to create TLS connector: {}", e)))?;
        let connector = TlsConnector::from(native_tls);

        let tls_stream = connector
            .connect(&config.host, tcp_stream)
            .await
            .map_err(|e| {
                MailError::Connect(format!("TLS handshake with {} failed: {}", config.host, e))
            })?;

        let client = async_imap::Client::new(tls_stream);

        let mut session = client
            .login(&config.username, &config.password)
            .await
            .map_err(|e| {
                MailError::Auth(format!("login rejected for {}: {}", config.username, e.0))
            })?;

        let mailbox = session.select(&config.mailbox).await.map_err(|e| {
            MailError::Connect(format!(
                "failed to select mailbox {}: {}",
                config.mailbox, e
            ))
        })?;

        info!(
            "Mailbox {} selected, uidvalidity={:?}",
            config.mailbox, mailbox.uid_validity
        );

        Ok(Self {
            config,
            uid_validity: mailbox.uid_validity,
            session,
        })
    }
}

#[async_trait]
impl MailboxSession for ImapTlsSession {
    async fn reopen(&self) -> MailResult<Self> {
        Self::connect(self.config.clone()).await
    }

    async fn uid_search(&mut self, criterion: SearchCriterion) -> MailResult<Vec<u32>> {
        let query = criterion.to_string();
        let result = self
            .session
            .uid_search(&query)
            .await
            .map_err(|e| MailError::Search(format!("uid search {:?} failed: {}", query, e)))?;

        let mut uids: Vec<u32> = result.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn uid_fetch(&mut self, uid: u32) -> MailResult<Option<RawMail>> {
        let mut fetch_stream = self
            .session
            .uid_fetch(uid.to_string(), "(RFC822 INTERNALDATE)")
            .await
            .map_err(|e| MailError::Load(format!("uid fetch {} failed: {}", uid, e)))?;

        let mut raw = None;
        while let Some(item) = fetch_stream.next().await {
            let fetch = item
                .map_err(|e| MailError::Load(format!("uid fetch {} stream error: {}", uid, e)))?;
            let (Some(body), Some(internal_date)) = (fetch.body(), fetch.internal_date()) else {
                continue;
            };
            raw = Some(RawMail {
                uid,
                body: body.to_vec(),
                internal_date: internal_date.format("%d-%b-%Y %H:%M:%S %z").to_string(),
            });
        }
        Ok(raw)
    }

    fn uid_validity(&self) -> Option<u32> {
        self.uid_validity
    }

    async fn close(&mut self) {
        if let Err(e) = self.session.close().await {
            warn!("IMAP CLOSE failed (ignored): {}", e);
        }
        if let Err(e) = self.session.logout().await {
            warn!("IMAP LOGOUT failed (ignored): {}", e);
        }
    }
}
