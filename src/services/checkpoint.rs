use crate::core::error::{MailError, MailResult};
use crate::services::connection::MailServerConnection;
use crate::services::mail::Mail;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 邮件监视检查点
///
/// 持有一个连接和一封参照邮件。参照邮件固定为检查点创建时刻的最新一封，
/// 轮询过程中不前移，因此每个批次都是相对创建时刻的全量新邮件。
pub struct MailCheckPoint {
    connection: Box<dyn MailServerConnection>,
    reference: Option<Mail>,
    uid_validity: Option<u32>,
}

impl MailCheckPoint {
    /// 以当前最新邮件为基准创建检查点；邮箱为空时基准为空
    pub async fn from_connection(
        mut connection: Box<dyn MailServerConnection>,
    ) -> MailResult<Self> {
        let reference = connection.latest_mail().await?;
        let uid_validity = connection.uid_validity();
        match &reference {
            Some(mail) => info!("Checkpoint created at uid {}", mail.uid()),
            None => info!("Checkpoint created on an empty mailbox"),
        }
        Ok(Self {
            connection,
            reference,
            uid_validity,
        })
    }

    pub fn reference_mail(&self) -> Option<&Mail> {
        self.reference.as_ref()
    }

    /// 轮询监视新邮件
    ///
    /// 每个周期把新邮件批次交给回调；回调返回 true 时正常结束。
    /// 超过 timeout 仍未收到停止信号时返回 [`MailError::MonitoringTimeout`]。
    pub async fn monitor<F>(
        &mut self,
        callback: F,
        interval: Duration,
        timeout: Duration,
    ) -> MailResult<()>
    where
        F: FnMut(&[Mail]) -> bool + Send,
    {
        self.monitor_with_cancel(callback, interval, timeout, CancellationToken::new())
            .await
    }

    /// 同 [`monitor`](Self::monitor)，可通过取消令牌从外部优雅停止
    pub async fn monitor_with_cancel<F>(
        &mut self,
        mut callback: F,
        interval: Duration,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> MailResult<()>
    where
        F: FnMut(&[Mail]) -> bool + Send,
    {
        let started = Instant::now();
        info!(
            "Monitoring started, interval={:?}, timeout={:?}",
            interval, timeout
        );

        loop {
            // idle sessions go stale on long-lived servers; poll on a fresh one
            let fresh = self.connection.create_new_connection().await?;
            let mut superseded = std::mem::replace(&mut self.connection, fresh);
            superseded.disconnect().await;

            self.check_mailbox_identity()?;

            // 空邮箱检查点走同样的缝隙容错扫描，首个 UID 从 1 起
            let batch = match &self.reference {
                Some(reference) => self.connection.latest_mail_over_than(reference).await?,
                None => self.connection.latest_mail_from(1).await?,
            };

            if batch.is_empty() {
                debug!("No new mail this cycle");
            } else {
                info!("Found {} new mail(s)", batch.len());
                if callback(&batch) {
                    info!("Callback requested stop, monitoring finished");
                    return Ok(());
                }
            }

            if started.elapsed() >= timeout {
                warn!("Monitoring timed out after {:?}", started.elapsed());
                return Err(MailError::MonitoringTimeout(timeout));
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Monitoring cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// UIDVALIDITY 变化意味着 UID 序列不再可比，立即失败而不是误读
    fn check_mailbox_identity(&self) -> MailResult<()> {
        let (Some(expected), Some(actual)) = (self.uid_validity, self.connection.uid_validity())
        else {
            return Ok(());
        };
        if expected != actual {
            return Err(MailError::MailboxIdentityChanged { expected, actual });
        }
        Ok(())
    }
}
