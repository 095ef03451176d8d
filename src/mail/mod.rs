//! Parsed email representation and RFC 822 parsing.
//!
//! `fetch` retrieves and parses the raw object; `attachments` relocates
//! supported attachments to long-term storage.

pub mod attachments;
pub mod fetch;

use chrono::{DateTime, FixedOffset};
use mail_parser::{MessageParser, MimeHeaders};

/// Content type used when an attachment declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An email attachment with its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Declared filename, empty when the part has none.
    pub filename: String,
    pub content_type: Option<String>,
    pub size: usize,
    pub content: Vec<u8>,
}

/// A parsed email.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub subject: String,
    /// Plain-text body, falling back to the HTML body.
    pub body: String,
    /// First `From` address, empty when absent.
    pub sender: String,
    /// First `To` address, empty when absent.
    pub recipient: String,
    /// `Date` header, in the sender's offset.
    pub received_at: Option<DateTime<FixedOffset>>,
    pub attachments: Vec<Attachment>,
}

impl ParsedMessage {
    /// Domain part of the recipient address.
    pub fn recipient_domain(&self) -> Option<&str> {
        recipient_domain(&self.recipient)
    }
}

/// Right-hand side of the last `@` in an address.
///
/// Returns `None` when the address has no `@` or nothing follows it.
pub fn recipient_domain(address: &str) -> Option<&str> {
    address
        .trim()
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|domain| !domain.is_empty())
}

/// Parse a raw RFC 822 message.
///
/// Returns `None` when the bytes do not contain a recognizable message.
pub fn parse_message(raw: &[u8]) -> Option<ParsedMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    // An input without any header parses to an empty shell; reject it.
    if parsed.headers().is_empty() {
        return None;
    }

    let attachments = parsed
        .attachments()
        .map(|part| {
            let content = part.contents().to_vec();
            Attachment {
                filename: part.attachment_name().unwrap_or_default().to_string(),
                content_type: part.content_type().map(|ct| match ct.subtype() {
                    Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                    None => ct.ctype().to_string(),
                }),
                size: content.len(),
                content,
            }
        })
        .collect();

    Some(ParsedMessage {
        subject: parsed.subject().unwrap_or_default().to_string(),
        body: extract_body(&parsed),
        sender: first_address(parsed.from()),
        recipient: first_address(parsed.to()),
        received_at: parsed
            .date()
            .and_then(|d| DateTime::parse_from_rfc3339(&d.to_rfc3339()).ok()),
        attachments,
    })
}

fn first_address(addr: Option<&mail_parser::Address>) -> String {
    addr.and_then(|a| a.first())
        .and_then(|a| a.address())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn extract_body(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0)
        && !text.trim().is_empty()
    {
        return text.to_string();
    }
    parsed
        .body_html(0)
        .map(|html| html.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Multipart message with a PDF and a ZIP attachment.
    pub(crate) const MULTIPART_EMAIL: &str = concat!(
        "From: Sales <sales@partner.example.com>\r\n",
        "To: inbox@ses.example.co.jp\r\n",
        "Subject: =?UTF-8?B?44CQ5Y2z5pel44CRUmVhY3TmoYjku7YgNDDjgJw1MOS4h+WGhg==?=\r\n",
        "Date: Thu, 01 Aug 2024 10:00:00 +0900\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n",
        "\r\n",
        "--XYZ\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Remote OK. Start ASAP.\r\n",
        "--XYZ\r\n",
        "Content-Type: application/pdf; name=\"skills.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"skills.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "JVBERi0xLjQK\r\n",
        "--XYZ\r\n",
        "Content-Type: application/zip; name=\"archive.zip\"\r\n",
        "Content-Disposition: attachment; filename=\"archive.zip\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "UEsDBA==\r\n",
        "--XYZ--\r\n",
    );

    const HTML_ONLY_EMAIL: &str = concat!(
        "From: a@x.com\r\n",
        "To: b@y.com\r\n",
        "Subject: html\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<p>Hello</p>\r\n",
    );

    #[test]
    fn recipient_domain_after_at() {
        assert_eq!(recipient_domain("a@b.co.jp"), Some("b.co.jp"));
    }

    #[test]
    fn recipient_domain_without_at_is_none() {
        assert_eq!(recipient_domain("not-an-address"), None);
        assert_eq!(recipient_domain(""), None);
        assert_eq!(recipient_domain("user@"), None);
    }

    #[test]
    fn recipient_domain_uses_last_at() {
        assert_eq!(recipient_domain("\"odd@local\"@host.jp"), Some("host.jp"));
    }

    #[test]
    fn parse_multipart_headers_and_body() {
        let msg = parse_message(MULTIPART_EMAIL.as_bytes()).unwrap();
        assert_eq!(msg.subject, "【即日】React案件 40〜50万円");
        assert_eq!(msg.sender, "sales@partner.example.com");
        assert_eq!(msg.recipient, "inbox@ses.example.co.jp");
        assert_eq!(msg.recipient_domain(), Some("ses.example.co.jp"));
        assert!(msg.body.contains("Remote OK"));
        assert_eq!(
            msg.received_at.unwrap().to_rfc3339(),
            "2024-08-01T10:00:00+09:00"
        );
    }

    #[test]
    fn parse_multipart_attachments() {
        let msg = parse_message(MULTIPART_EMAIL.as_bytes()).unwrap();
        assert_eq!(msg.attachments.len(), 2);

        let pdf = &msg.attachments[0];
        assert_eq!(pdf.filename, "skills.pdf");
        assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(pdf.content, b"%PDF-1.4\n");
        assert_eq!(pdf.size, pdf.content.len());

        assert_eq!(msg.attachments[1].filename, "archive.zip");
    }

    #[test]
    fn parse_html_only_body_falls_back() {
        let msg = parse_message(HTML_ONLY_EMAIL.as_bytes()).unwrap();
        assert!(msg.body.contains("Hello"));
        assert!(msg.attachments.is_empty());
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(parse_message(b"").is_none());
    }
}
