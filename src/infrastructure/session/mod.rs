use crate::core::error::MailResult;
use async_trait::async_trait;
use std::fmt;

pub mod imap_tls;
pub mod mock;

pub use imap_tls::ImapTlsSession;
pub use mock::{MockMailbox, MockSession};

/// 从服务器取回的一封原始邮件
#[derive(Debug, Clone)]
pub struct RawMail {
    pub uid: u32,
    pub body: Vec<u8>,
    pub internal_date: String,
}

/// UID 检索条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriterion {
    All,
    Unseen,
    /// UID 大于等于指定值
    UidFrom(u32),
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriterion::All => write!(f, "ALL"),
            SearchCriterion::Unseen => write!(f, "UNSEEN"),
            SearchCriterion::UidFrom(uid) => write!(f, "UID {}:*", uid),
        }
    }
}

/// 与邮箱的有状态会话（已登录、已选择邮箱）
#[async_trait]
pub trait MailboxSession: Send + Sync + 'static {
    /// 用相同参数重新建立一个新会话
    async fn reopen(&self) -> MailResult<Self>
    where
        Self: Sized;

    /// 返回符合条件的 UID 一览（升序）
    async fn uid_search(&mut self, criterion: SearchCriterion) -> MailResult<Vec<u32>>;

    /// 取回指定 UID 的原始报文；已被索引但无内容时返回 None
    async fn uid_fetch(&mut self, uid: u32) -> MailResult<Option<RawMail>>;

    /// 选择邮箱时服务器报告的 UIDVALIDITY
    fn uid_validity(&self) -> Option<u32>;

    /// 尽力关闭会话，错误被吞掉
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_criterion_query_syntax() {
        assert_eq!(SearchCriterion::All.to_string(), "ALL");
        assert_eq!(SearchCriterion::Unseen.to_string(), "UNSEEN");
        assert_eq!(SearchCriterion::UidFrom(42).to_string(), "UID 42:*");
    }
}
