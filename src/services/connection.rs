use crate::core::error::{MailError, MailResult};
use crate::infrastructure::session::{MailboxSession, SearchCriterion};
use crate::services::checkpoint::MailCheckPoint;
use crate::services::mail::Mail;
use async_trait::async_trait;
use tracing::debug;

/// 已认证的邮件服务器连接
///
/// 一个连接独占一个会话；不支持多个调用方并发使用同一连接。
#[async_trait]
pub trait MailServerConnection: Send {
    /// 取得最新一封邮件，邮箱为空时返回 None
    async fn latest_mail(&mut self) -> MailResult<Option<Mail>>;

    /// 取得最新 count 封邮件（升序）；不足 count 封时返回全部
    async fn latest_mail_by_count(&mut self, count: usize) -> MailResult<Vec<Mail>>;

    /// 取得所有未读邮件（升序）
    async fn latest_unseen_mail(&mut self) -> MailResult<Vec<Mail>>;

    /// 取得 UID 大于参照邮件的所有邮件（升序），没有时返回空
    async fn latest_mail_over_than(&mut self, reference: &Mail) -> MailResult<Vec<Mail>>;

    /// 取得 UID 不小于 lower 的所有邮件（升序）；
    /// 遇到尚取不到内容的 UID 时在缝隙处截断并返回已取得的部分
    async fn latest_mail_from(&mut self, lower: u32) -> MailResult<Vec<Mail>>;

    /// 用相同参数建立一个新的已认证连接
    async fn create_new_connection(&self) -> MailResult<Box<dyn MailServerConnection>>;

    /// 尽力断开连接，错误被吞掉
    async fn disconnect(&mut self);

    /// 邮箱的 UIDVALIDITY（连接建立时取得）
    fn uid_validity(&self) -> Option<u32>;
}

/// 基于 [`MailboxSession`] 的连接实现
pub struct SessionConnection<S: MailboxSession> {
    session: S,
}

impl<S: MailboxSession> SessionConnection<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn boxed(session: S) -> Box<dyn MailServerConnection> {
        Box::new(Self::new(session))
    }

    /// 以当前最新邮件为基准创建检查点，连接的所有权转移给检查点
    pub async fn create_checkpoint(self) -> MailResult<MailCheckPoint> {
        MailCheckPoint::from_connection(Box::new(self)).await
    }

    async fn load_mail(&mut self, uid: u32) -> MailResult<Mail> {
        let raw = self
            .session
            .uid_fetch(uid)
            .await?
            .ok_or(MailError::MessageNotFound(uid))?;
        Mail::parse(raw.uid, &raw.body, &raw.internal_date)
    }

    async fn load_each(&mut self, uids: &[u32]) -> MailResult<Vec<Mail>> {
        let mut mails = Vec::with_capacity(uids.len());
        for &uid in uids {
            mails.push(self.load_mail(uid).await?);
        }
        Ok(mails)
    }
}

#[async_trait]
impl<S: MailboxSession> MailServerConnection for SessionConnection<S> {
    async fn latest_mail(&mut self) -> MailResult<Option<Mail>> {
        Ok(self.latest_mail_by_count(1).await?.pop())
    }

    async fn latest_mail_by_count(&mut self, count: usize) -> MailResult<Vec<Mail>> {
        let uids = self.session.uid_search(SearchCriterion::All).await?;
        let start = uids.len().saturating_sub(count);
        self.load_each(&uids[start..]).await
    }

    async fn latest_unseen_mail(&mut self) -> MailResult<Vec<Mail>> {
        let uids = self.session.uid_search(SearchCriterion::Unseen).await?;
        self.load_each(&uids).await
    }

    async fn latest_mail_over_than(&mut self, reference: &Mail) -> MailResult<Vec<Mail>> {
        self.latest_mail_from(reference.uid().saturating_add(1)).await
    }

    async fn latest_mail_from(&mut self, lower: u32) -> MailResult<Vec<Mail>> {
        let uids = self.session.uid_search(SearchCriterion::UidFrom(lower)).await?;

        let mut mails = Vec::new();
        for uid in uids {
            // "K:*" echoes back the newest message even when K is past the end
            if uid < lower {
                continue;
            }
            match self.load_mail(uid).await {
                Ok(mail) => mails.push(mail),
                // the UID is indexed but its content is not retrievable yet;
                // end the scan at the gap and return what was fetched so far
                Err(MailError::MessageNotFound(uid)) => {
                    debug!("No data for uid {} yet, ending scan at the gap", uid);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(mails)
    }

    async fn create_new_connection(&self) -> MailResult<Box<dyn MailServerConnection>> {
        let session = self.session.reopen().await?;
        Ok(Box::new(SessionConnection::new(session)))
    }

    async fn disconnect(&mut self) {
        self.session.close().await;
    }

    fn uid_validity(&self) -> Option<u32> {
        self.session.uid_validity()
    }
}
