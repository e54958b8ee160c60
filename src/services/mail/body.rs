/// 邮件正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailBody {
    PlainText { content: String },
    Html { content: String },
}

impl MailBody {
    /// 空的纯文本正文
    pub fn empty() -> Self {
        MailBody::PlainText {
            content: String::new(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MailBody::PlainText { .. } => "text/plain",
            MailBody::Html { .. } => "text/html",
        }
    }

    /// 未经渲染的原始内容
    pub fn raw_content(&self) -> &str {
        match self {
            MailBody::PlainText { content } | MailBody::Html { content } => content,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_content().is_empty()
    }

    /// 渲染为可见文本；HTML 正文在此去除标签
    pub fn render(&self) -> String {
        match self {
            MailBody::PlainText { content } => content.clone(),
            MailBody::Html { content } => strip_html_tags(content),
        }
    }
}

/// 去除 HTML 标签，按文档顺序拼接非空白文本节点
fn strip_html_tags(html: &str) -> String {
    let mut rendered = String::new();
    let mut node = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' if !in_tag => {
                in_tag = true;
                if !node.trim().is_empty() {
                    rendered.push_str(&node);
                }
                node.clear();
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => node.push(ch),
        }
    }
    if !node.trim().is_empty() {
        rendered.push_str(&node);
    }

    rendered.trim().to_string()
}
