use crate::core::error::{MailError, MailResult};
use std::fmt;

/// 邮件地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress {
    address: String,
    display_name: Option<String>,
    local_part: String,
    domain: String,
    is_plus_addressed: bool,
    plus_base_name: String,
    plus_tag: String,
}

impl MailAddress {
    /// 解析邮件地址字符串
    pub fn parse(raw_address: &str, raw_name: &str) -> MailResult<Self> {
        let (local_part, domain) = raw_address
            .split_once('@')
            .ok_or_else(|| MailError::InvalidAddressFormat(raw_address.to_string()))?;
        if local_part.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(MailError::InvalidAddressFormat(raw_address.to_string()));
        }

        let (is_plus_addressed, plus_base_name, plus_tag) = match local_part.split_once('+') {
            Some((base, tag)) => (true, base.to_string(), tag.to_string()),
            None => (false, local_part.to_string(), String::new()),
        };

        let display_name = if raw_name.is_empty() {
            None
        } else {
            Some(raw_name.to_string())
        };

        Ok(Self {
            address: raw_address.to_string(),
            display_name,
            local_part: local_part.to_string(),
            domain: domain.to_string(),
            is_plus_addressed,
            plus_base_name,
            plus_tag,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 用户部是否带有 "+tag" 形式的子地址
    pub fn is_plus_addressed(&self) -> bool {
        self.is_plus_addressed
    }

    /// 子地址的基础名；非子地址时与用户部相同
    pub fn plus_base_name(&self) -> &str {
        &self.plus_base_name
    }

    /// 子地址的标签名；非子地址时为空字符串
    pub fn plus_tag(&self) -> &str {
        &self.plus_tag
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_address() {
        let addr = MailAddress::parse("alice@example.com", "").unwrap();
        assert_eq!(addr.address(), "alice@example.com");
        assert_eq!(addr.local_part(), "alice");
        assert_eq!(addr.domain(), "example.com");
        assert!(!addr.is_plus_addressed());
        assert_eq!(addr.plus_base_name(), "alice");
        assert_eq!(addr.plus_tag(), "");
        assert_eq!(addr.display_name(), None);
    }

    #[test]
    fn test_parse_plus_addressed() {
        let addr = MailAddress::parse("a+b@example.com", "Alice").unwrap();
        assert!(addr.is_plus_addressed());
        assert_eq!(addr.plus_base_name(), "a");
        assert_eq!(addr.plus_tag(), "b");
        assert_eq!(addr.display_name(), Some("Alice"));
    }

    #[test]
    fn test_parse_plus_splits_on_first_plus_only() {
        let addr = MailAddress::parse("a+b+c@example.com", "").unwrap();
        assert_eq!(addr.plus_base_name(), "a");
        assert_eq!(addr.plus_tag(), "b+c");
    }

    #[test]
    fn test_parse_rejects_missing_at() {
        assert!(matches!(
            MailAddress::parse("not-an-address", ""),
            Err(MailError::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(MailAddress::parse("@example.com", "").is_err());
        assert!(MailAddress::parse("alice@", "").is_err());
        assert!(MailAddress::parse("a@b@c", "").is_err());
    }

    #[test]
    fn test_display_with_and_without_name() {
        let named = MailAddress::parse("alice@example.com", "Alice").unwrap();
        assert_eq!(named.to_string(), "Alice <alice@example.com>");

        let bare = MailAddress::parse("alice@example.com", "").unwrap();
        assert_eq!(bare.to_string(), "alice@example.com");
    }
}
