use super::{MailboxSession, RawMail, SearchCriterion};
use crate::core::error::MailResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredMail {
    raw: Vec<u8>,
    internal_date: String,
    seen: bool,
}

#[derive(Debug, Default)]
struct MailboxState {
    // None = UID 已被索引但内容尚不可取
    messages: BTreeMap<u32, Option<StoredMail>>,
    next_uid: u32,
    uid_validity: u32,
}

/// 内存邮箱，供测试和演示使用
#[derive(Clone)]
pub struct MockMailbox {
    inner: Arc<Mutex<MailboxState>>,
}

impl Default for MockMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailbox {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MailboxState {
                messages: BTreeMap::new(),
                next_uid: 1,
                uid_validity: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.inner.lock().unwrap()
    }

    /// 投递一封邮件，返回分配的 UID
    pub fn deliver(&self, raw: impl Into<Vec<u8>>, internal_date: &str) -> u32 {
        let mut state = self.lock();
        let uid = state.next_uid;
        state.next_uid += 1;
        state.messages.insert(
            uid,
            Some(StoredMail {
                raw: raw.into(),
                internal_date: internal_date.to_string(),
                seen: false,
            }),
        );
        uid
    }

    /// 投递一个已被索引但内容取不到的 UID，模拟索引先行于内容的竞争
    pub fn deliver_unavailable(&self) -> u32 {
        let mut state = self.lock();
        let uid = state.next_uid;
        state.next_uid += 1;
        state.messages.insert(uid, None);
        uid
    }

    pub fn mark_seen(&self, uid: u32) {
        let mut state = self.lock();
        if let Some(Some(mail)) = state.messages.get_mut(&uid) {
            mail.seen = true;
        }
    }

    /// 模拟邮箱被重建，UIDVALIDITY 发生变化
    pub fn reset_uid_validity(&self) {
        self.lock().uid_validity += 1;
    }

    /// 打开一个指向本邮箱的会话
    pub fn session(&self) -> MockSession {
        MockSession {
            mailbox: self.clone(),
        }
    }
}

/// 指向 [`MockMailbox`] 的会话
pub struct MockSession {
    mailbox: MockMailbox,
}

#[async_trait]
impl MailboxSession for MockSession {
    async fn reopen(&self) -> MailResult<Self> {
        Ok(self.mailbox.session())
    }

    async fn uid_search(&mut self, criterion: SearchCriterion) -> MailResult<Vec<u32>> {
        let state = self.mailbox.lock();
        let uids = match criterion {
            SearchCriterion::All => state.messages.keys().copied().collect(),
            SearchCriterion::Unseen => state
                .messages
                .iter()
                .filter(|(_, entry)| entry.as_ref().is_some_and(|m| !m.seen))
                .map(|(uid, _)| *uid)
                .collect(),
            SearchCriterion::UidFrom(from) => {
                let hits: Vec<u32> = state.messages.range(from..).map(|(uid, _)| *uid).collect();
                if hits.is_empty() {
                    // 真实服务器对 "K:*" 的行为：即使 K 超过最大 UID 也返回最新一封
                    state
                        .messages
                        .keys()
                        .next_back()
                        .map(|uid| vec![*uid])
                        .unwrap_or_default()
                } else {
                    hits
                }
            }
        };
        Ok(uids)
    }

    async fn uid_fetch(&mut self, uid: u32) -> MailResult<Option<RawMail>> {
        let state = self.mailbox.lock();
        Ok(state
            .messages
            .get(&uid)
            .and_then(|entry| entry.as_ref())
            .map(|mail| RawMail {
                uid,
                body: mail.raw.clone(),
                internal_date: mail.internal_date.clone(),
            }))
    }

    fn uid_validity(&self) -> Option<u32> {
        Some(self.mailbox.lock().uid_validity)
    }

    async fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uids_are_assigned_in_order() {
        let mailbox = MockMailbox::new();
        assert_eq!(mailbox.deliver(b"one".to_vec(), "d"), 1);
        assert_eq!(mailbox.deliver(b"two".to_vec(), "d"), 2);

        let mut session = mailbox.session();
        assert_eq!(
            session.uid_search(SearchCriterion::All).await.unwrap(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_unseen_search_excludes_seen_mail() {
        let mailbox = MockMailbox::new();
        let first = mailbox.deliver(b"one".to_vec(), "d");
        let second = mailbox.deliver(b"two".to_vec(), "d");
        mailbox.mark_seen(first);

        let mut session = mailbox.session();
        assert_eq!(
            session.uid_search(SearchCriterion::Unseen).await.unwrap(),
            vec![second]
        );
    }

    #[tokio::test]
    async fn test_uid_from_past_the_end_echoes_newest() {
        let mailbox = MockMailbox::new();
        mailbox.deliver(b"one".to_vec(), "d");
        let last = mailbox.deliver(b"two".to_vec(), "d");

        let mut session = mailbox.session();
        assert_eq!(
            session
                .uid_search(SearchCriterion::UidFrom(last + 1))
                .await
                .unwrap(),
            vec![last]
        );
    }

    #[tokio::test]
    async fn test_unavailable_uid_fetches_as_none() {
        let mailbox = MockMailbox::new();
        let uid = mailbox.deliver_unavailable();

        let mut session = mailbox.session();
        assert!(session.uid_fetch(uid).await.unwrap().is_none());
        assert!(session
            .uid_search(SearchCriterion::All)
            .await
            .unwrap()
            .contains(&uid));
    }
}
