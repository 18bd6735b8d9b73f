//! SMTP service records and request parameters.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::live_chat::JsonMap;
use super::types::{api_datetime, format_date, null_default};

/// Name and address pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub name: String,
    pub email: String,
}

impl EmailAddress {
    /// Creates an address from a display name and email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Stored template reference with substitution variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub variables: JsonMap,
}

/// Transactional email.
///
/// Usually exactly one of `html`, `text` or `template` carries the body.
/// `html` is plain markup here; it is base64-encoded when sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendEmailParams {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub html: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub template: Option<EmailTemplate>,
    pub auto_plain_text: bool,
    pub subject: String,
    pub from: EmailAddress,
    pub to: EmailAddress,
    /// File name to file content. Sent as `null` when absent.
    pub attachments: Option<BTreeMap<String, String>>,
}

/// A sent message with delivery and tracking data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpMessage {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub sender: String,
    pub total_size: i64,
    #[serde(deserialize_with = "null_default")]
    pub sender_ip: String,
    pub smtp_answer_code: i32,
    #[serde(deserialize_with = "null_default")]
    pub smtp_answer_code_explain: String,
    #[serde(deserialize_with = "null_default")]
    pub smtp_answer_subcode: String,
    #[serde(deserialize_with = "null_default")]
    pub smtp_answer_data: String,
    #[serde(deserialize_with = "null_default")]
    pub used_ip: String,
    #[serde(deserialize_with = "null_default")]
    pub recipient: String,
    #[serde(deserialize_with = "null_default")]
    pub subject: String,
    #[serde(with = "api_datetime")]
    pub send_date: Option<NaiveDateTime>,
    pub tracking: Tracking,
}

/// Open and click tracking for a sent message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracking {
    pub click: i64,
    pub open: i64,
    #[serde(deserialize_with = "null_default")]
    pub link: Vec<LinkClick>,
    #[serde(deserialize_with = "null_default")]
    pub client_info: Vec<ClientInfo>,
}

/// A tracked link click.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkClick {
    #[serde(deserialize_with = "null_default")]
    pub url: String,
    #[serde(deserialize_with = "null_default")]
    pub browser: String,
    #[serde(deserialize_with = "null_default")]
    pub os: String,
    #[serde(deserialize_with = "null_default")]
    pub screen_resolution: String,
    #[serde(deserialize_with = "null_default")]
    pub ip: String,
    #[serde(with = "api_datetime")]
    pub action_date: Option<NaiveDateTime>,
}

/// A tracked open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    #[serde(deserialize_with = "null_default")]
    pub browser: String,
    #[serde(deserialize_with = "null_default")]
    pub os: String,
    #[serde(deserialize_with = "null_default")]
    pub ip: String,
    #[serde(with = "api_datetime")]
    pub action_date: Option<NaiveDateTime>,
}

/// Filter for the sent message list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmtpListParams {
    /// Omitted when `None` or zero.
    pub limit: Option<u32>,
    /// Always sent.
    pub offset: u32,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl SmtpListParams {
    /// `offset=..[&limit=..][&from=..][&to=..][&sender=..][&recipient=..]`
    pub fn query_string(&self) -> String {
        let mut parts = vec![format!("offset={}", self.offset)];
        if let Some(limit) = self.limit.filter(|l| *l != 0) {
            parts.push(format!("limit={}", limit));
        }
        if let Some(from) = self.from {
            parts.push(format!("from={}", format_date(from)));
        }
        if let Some(to) = self.to {
            parts.push(format!("to={}", format_date(to)));
        }
        if let Some(sender) = self.sender.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("sender={}", sender));
        }
        if let Some(recipient) = self.recipient.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("recipient={}", recipient));
        }
        parts.join("&")
    }
}

/// Daily bounce report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BouncesList {
    pub total: i64,
    #[serde(deserialize_with = "null_default")]
    pub emails: Vec<Bounce>,
    pub request_limit: i64,
    pub found: i64,
}

/// A bounced message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounce {
    #[serde(deserialize_with = "null_default")]
    pub email_to: String,
    #[serde(deserialize_with = "null_default")]
    pub sender: String,
    #[serde(with = "api_datetime")]
    pub send_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "null_default")]
    pub subject: String,
    pub smtp_answer_code: i32,
    #[serde(deserialize_with = "null_default")]
    pub smtp_answer_subcode: String,
    #[serde(deserialize_with = "null_default")]
    pub smtp_answer_data: String,
}

/// Address to add to the unsubscribe list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeEmail {
    pub email: String,
    pub comment: String,
}

impl UnsubscribeEmail {
    /// Creates an entry with an optional comment (may be empty).
    pub fn new(email: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            comment: comment.into(),
        }
    }
}

/// Filter for the unsubscribe list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnsubscribedListParams {
    /// Omitted when `None` or zero.
    pub limit: Option<u32>,
    /// Always sent.
    pub offset: u32,
    pub date: Option<NaiveDate>,
}

impl UnsubscribedListParams {
    /// `offset=..[&limit=..][&date=..]`
    pub fn query_string(&self) -> String {
        let mut query = format!("offset={}", self.offset);
        if let Some(limit) = self.limit.filter(|l| *l != 0) {
            query.push_str(&format!("&limit={}", limit));
        }
        if let Some(date) = self.date {
            query.push_str(&format!("&date={}", format_date(date)));
        }
        query
    }
}

/// Unsubscribe list entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unsubscribed {
    #[serde(deserialize_with = "null_default")]
    pub email: String,
    pub unsubscribe_by_link: i32,
    pub unsubscribe_by_user: i32,
    pub spam_complaint: i32,
    #[serde(with = "api_datetime")]
    pub date: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn list_query_defaults_to_offset_only() {
        assert_eq!(SmtpListParams::default().query_string(), "offset=0");
    }

    #[test]
    fn list_query_includes_filters_in_order() {
        let params = SmtpListParams {
            limit: Some(25),
            offset: 50,
            from: Some(date(2024, 1, 1)),
            to: Some(date(2024, 1, 31)),
            sender: Some("news@example.com".to_string()),
            recipient: Some("bob@example.com".to_string()),
        };
        assert_eq!(
            params.query_string(),
            "offset=50&limit=25&from=2024-01-01&to=2024-01-31&sender=news@example.com&recipient=bob@example.com"
        );
    }

    #[test]
    fn list_query_skips_zero_limit_and_empty_strings() {
        let params = SmtpListParams {
            limit: Some(0),
            sender: Some(String::new()),
            to: Some(date(2023, 12, 5)),
            ..Default::default()
        };
        assert_eq!(params.query_string(), "offset=0&to=2023-12-05");
    }

    #[test]
    fn unsubscribed_query() {
        let params = UnsubscribedListParams {
            limit: Some(10),
            offset: 5,
            date: Some(date(2024, 2, 29)),
        };
        assert_eq!(params.query_string(), "offset=5&limit=10&date=2024-02-29");
        assert_eq!(UnsubscribedListParams::default().query_string(), "offset=0");
    }

    #[test]
    fn send_params_serialization() {
        let params = SendEmailParams {
            text: "Hi".to_string(),
            subject: "Welcome".to_string(),
            from: EmailAddress::new("Shop", "shop@example.com"),
            to: EmailAddress::new("Bob", "bob@example.com"),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            json!({
                "text": "Hi",
                "template": null,
                "auto_plain_text": false,
                "subject": "Welcome",
                "from": {"name": "Shop", "email": "shop@example.com"},
                "to": {"name": "Bob", "email": "bob@example.com"},
                "attachments": null
            })
        );
    }

    #[test]
    fn send_params_with_template_and_attachments() {
        let mut variables = JsonMap::new();
        variables.insert("name".to_string(), json!("Bob"));
        let mut attachments = BTreeMap::new();
        attachments.insert("invoice.txt".to_string(), "total: 10".to_string());

        let params = SendEmailParams {
            template: Some(EmailTemplate {
                id: "tpl-1".to_string(),
                variables,
            }),
            attachments: Some(attachments),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["template"], json!({"id": "tpl-1", "variables": {"name": "Bob"}}));
        assert_eq!(json["attachments"], json!({"invoice.txt": "total: 10"}));
        assert!(json.get("html").is_none());
    }

    #[test]
    fn smtp_message_decoding() {
        let message: SmtpMessage = serde_json::from_value(json!({
            "id": "m1",
            "sender": "shop@example.com",
            "total_size": 1024,
            "smtp_answer_code": 250,
            "recipient": "bob@example.com",
            "subject": "Welcome",
            "send_date": "2024-01-02 03:04:05",
            "tracking": {
                "click": 1,
                "open": 2,
                "link": [{"url": "https://example.com", "ip": "10.0.0.1", "action_date": "2024-01-02 04:00:00"}],
                "client_info": null
            }
        }))
        .unwrap();

        assert_eq!(message.id, "m1");
        assert_eq!(message.smtp_answer_code, 250);
        assert!(message.send_date.is_some());
        assert_eq!(message.tracking.link.len(), 1);
        assert_eq!(message.tracking.link[0].url, "https://example.com");
        assert!(message.tracking.client_info.is_empty());
    }

    #[test]
    fn tracking_tolerates_nulls() {
        let message: SmtpMessage = serde_json::from_value(json!({
            "id": null,
            "tracking": {
                "link": [{"url": null, "browser": null, "os": null, "screen_resolution": null, "ip": null}],
                "client_info": [{"browser": null, "os": "linux", "ip": null, "action_date": null}]
            }
        }))
        .unwrap();

        assert!(message.id.is_empty());
        assert!(message.tracking.link[0].screen_resolution.is_empty());
        assert_eq!(message.tracking.client_info[0].os, "linux");
        assert!(message.tracking.client_info[0].browser.is_empty());
    }

    #[test]
    fn bounces_tolerate_nulls() {
        let bounces: BouncesList = serde_json::from_value(json!({
            "total": 2,
            "emails": [
                {"email_to": "x@example.com", "sender": null},
                {"email_to": null, "subject": null, "smtp_answer_subcode": null, "smtp_answer_data": null}
            ]
        }))
        .unwrap();

        assert_eq!(bounces.emails.len(), 2);
        assert_eq!(bounces.emails[0].email_to, "x@example.com");
        assert!(bounces.emails[0].sender.is_empty());
        assert!(bounces.emails[1].smtp_answer_subcode.is_empty());
    }

    #[test]
    fn unsubscribed_tolerates_nulls() {
        let entries: Vec<Unsubscribed> = serde_json::from_value(json!([
            {"email": null, "unsubscribe_by_link": 1, "date": "2024-03-01 09:00:00"}
        ]))
        .unwrap();
        assert!(entries[0].email.is_empty());
        assert_eq!(entries[0].unsubscribe_by_link, 1);
        assert!(entries[0].date.is_some());
    }
}
