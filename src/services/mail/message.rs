use crate::core::error::{MailError, MailResult};
use crate::services::mail::address::MailAddress;
use crate::services::mail::body::MailBody;
use chrono::{DateTime, Local};
use mail_parser::{Address, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// IMAP INTERNALDATE 的日期格式 (例: 01-Feb-2026 10:30:00 +0900)
const INTERNAL_DATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// 已解析的一封邮件
#[derive(Debug, Clone)]
pub struct Mail {
    uid: u32,
    from_address: Option<MailAddress>,
    to_addresses: Vec<MailAddress>,
    subject: String,
    reception_datetime: DateTime<Local>,
    body: MailBody,
    raw: Vec<u8>,
}

impl Mail {
    /// 把服务器返回的原始报文解析为邮件实例
    pub fn parse(uid: u32, raw: &[u8], internal_date: &str) -> MailResult<Self> {
        let message = MessageParser::default().parse(raw).ok_or_else(|| {
            MailError::MalformedData(format!("unparsable message payload, uid={}", uid))
        })?;

        let mut from_addresses = Self::header_addresses(message.from());
        let to_addresses = Self::header_addresses(message.to());
        let subject = message.subject().unwrap_or("").to_string();
        let reception_datetime = Self::parse_internal_date(internal_date)?;
        let body = Self::select_body(&message);

        Ok(Self {
            uid,
            from_address: if from_addresses.is_empty() {
                None
            } else {
                Some(from_addresses.remove(0))
            },
            to_addresses,
            subject,
            reception_datetime,
            body,
            raw: raw.to_vec(),
        })
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn from_address(&self) -> Option<&MailAddress> {
        self.from_address.as_ref()
    }

    pub fn to_addresses(&self) -> &[MailAddress] {
        &self.to_addresses
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn reception_datetime(&self) -> DateTime<Local> {
        self.reception_datetime
    }

    pub fn body(&self) -> &MailBody {
        &self.body
    }

    /// 原始报文字节，用于无损持久化
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// 把原始报文保存为 <目录>/<YYYYMMDD_HHMMSS>_<主题>.eml
    pub fn save_to_file(&self, directory: impl AsRef<Path>) -> MailResult<PathBuf> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;

        let file_name = format!(
            "{}_{}.eml",
            self.reception_datetime.format("%Y%m%d_%H%M%S"),
            Self::sanitize_subject(&self.subject)
        );
        let path = directory.join(file_name);
        fs::write(&path, &self.raw)?;
        Ok(path)
    }

    /// 把文件名中非法的字符替换为下划线
    fn sanitize_subject(subject: &str) -> String {
        subject
            .chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                other => other,
            })
            .collect()
    }

    fn header_addresses(header: Option<&Address>) -> Vec<MailAddress> {
        let Some(header) = header else {
            return Vec::new();
        };
        header
            .iter()
            .filter_map(|entry| {
                let address = entry.address.as_deref()?;
                let name = entry.name.as_deref().unwrap_or("");
                match MailAddress::parse(address, name) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        debug!("Skipping malformed address entry: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    fn parse_internal_date(value: &str) -> MailResult<DateTime<Local>> {
        DateTime::parse_from_str(value.trim(), INTERNAL_DATE_FORMAT)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|e| MailError::MalformedData(format!("invalid internal date {:?}: {}", value, e)))
    }

    /// 从报文中挑选正文部分
    ///
    /// 多部分邮件取文档顺序上第一个非附件的 text/plain 部分，找不到时正文为空。
    /// 单部分邮件原样采用其唯一内容。
    fn select_body(message: &Message<'_>) -> MailBody {
        let root = message.parts.first();
        let is_multipart = matches!(root.map(|p| &p.body), Some(PartType::Multipart(_)));

        if is_multipart {
            for part in &message.parts {
                let PartType::Text(text) = &part.body else {
                    continue;
                };
                if Self::is_attachment(part) || !Self::is_plain_text(part) {
                    continue;
                }
                return MailBody::PlainText {
                    content: text.to_string(),
                };
            }
            return MailBody::empty();
        }

        match root.map(|p| &p.body) {
            Some(PartType::Text(text)) => MailBody::PlainText {
                content: text.to_string(),
            },
            Some(PartType::Html(html)) => MailBody::Html {
                content: html.to_string(),
            },
            Some(PartType::Binary(data)) | Some(PartType::InlineBinary(data)) => {
                MailBody::PlainText {
                    content: String::from_utf8_lossy(data).into_owned(),
                }
            }
            _ => MailBody::empty(),
        }
    }

    fn is_attachment(part: &MessagePart<'_>) -> bool {
        part.content_disposition()
            .map(|cd| cd.c_type.eq_ignore_ascii_case("attachment"))
            .unwrap_or(false)
    }

    /// 声明的内容类型必须正是 text/plain；text/csv 等其它 text/* 不算正文。
    /// 未声明 Content-Type 的部分按 text/plain 对待。
    fn is_plain_text(part: &MessagePart<'_>) -> bool {
        match part.content_type() {
            Some(ct) => {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct.subtype().is_some_and(|s| s.eq_ignore_ascii_case("plain"))
            }
            None => true,
        }
    }
}
