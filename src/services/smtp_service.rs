//! Transactional email (SMTP) service.
//!
//! The `/smtp/*` endpoints answer with bare payloads rather than the
//! `{success, data}` envelope used by live chat. A `null` or empty body
//! decodes to the empty value of the expected type.

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{
    format_date, BouncesList, SendEmailParams, SmtpListParams, SmtpMessage, UnsubscribeEmail,
    Unsubscribed, UnsubscribedListParams,
};
use crate::transport::{decode, encode, Method, Result, Transport};

#[derive(Serialize)]
struct SendEmailBody<'a> {
    email: &'a SendEmailParams,
}

#[derive(Serialize)]
struct UnsubscribeBody<'a> {
    emails: &'a [UnsubscribeEmail],
}

#[derive(Serialize)]
struct DeleteUnsubscribedBody<'a> {
    emails: &'a [String],
}

#[derive(Serialize)]
struct DomainBody<'a> {
    email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SendEmailResponse {
    result: bool,
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TotalResponse {
    total: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResultResponse {
    result: bool,
}

/// Client for the SMTP endpoints.
#[derive(Clone)]
pub struct SmtpService {
    transport: Arc<dyn Transport>,
}

impl SmtpService {
    /// Creates an SMTP service over a shared transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Calls an endpoint; a `null` body decodes to `T::default()`.
    async fn call<T: DeserializeOwned + Default>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let value = self.transport.request(method, path, body, true).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        decode(value)
    }

    /// Calls an endpoint answering `{"result": bool}`.
    async fn call_for_result(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        let response: ResultResponse = self.call(method, path, body).await?;
        if !response.result {
            tracing::debug!(path, "SMTP API reported result=false");
        }
        Ok(())
    }

    /// Sends an email and returns its SendPulse id.
    ///
    /// A non-empty `html` body is base64-encoded before sending.
    pub async fn send(&self, mut params: SendEmailParams) -> Result<String> {
        if !params.html.is_empty() {
            params.html = BASE64_STANDARD.encode(params.html.as_bytes());
        }

        let body = encode(&SendEmailBody { email: &params })?;
        let response: SendEmailResponse = self.call(Method::POST, "/smtp/emails", Some(body)).await?;

        if response.result {
            tracing::info!(message_id = %response.id, "Email sent via SendPulse SMTP");
        } else {
            tracing::debug!("SMTP send reported result=false");
        }
        Ok(response.id)
    }

    /// Lists sent messages.
    pub async fn list(&self, params: &SmtpListParams) -> Result<Vec<SmtpMessage>> {
        let path = format!("/smtp/emails?{}", params.query_string());
        self.call(Method::GET, &path, None).await
    }

    /// Total number of sent messages.
    pub async fn total(&self) -> Result<i64> {
        let response: TotalResponse = self.call(Method::GET, "/smtp/emails/total", None).await?;
        Ok(response.total)
    }

    /// Fetches a sent message by id.
    pub async fn get(&self, id: i64) -> Result<Option<SmtpMessage>> {
        self.call(Method::GET, &format!("/smtp/emails/{}", id), None)
            .await
    }

    /// Bounces for a day; without `date` the API reports the current day.
    pub async fn daily_bounces(
        &self,
        limit: u32,
        offset: u32,
        date: Option<chrono::NaiveDate>,
    ) -> Result<BouncesList> {
        let mut path = format!("/smtp/bounces/day?limit={}&offset={}", limit, offset);
        if let Some(date) = date {
            path.push_str(&format!("&date={}", format_date(date)));
        }
        self.call(Method::GET, &path, None).await
    }

    /// Number of bounces today.
    pub async fn total_bounces(&self) -> Result<i64> {
        let response: TotalResponse = self
            .call(Method::GET, "/smtp/bounces/day/total", None)
            .await?;
        Ok(response.total)
    }

    /// Adds addresses to the unsubscribe list in one request.
    pub async fn unsubscribe(&self, emails: &[UnsubscribeEmail]) -> Result<()> {
        let body = encode(&UnsubscribeBody { emails })?;
        self.call_for_result(Method::POST, "/smtp/unsubscribe", Some(body))
            .await
    }

    /// Removes addresses from the unsubscribe list in one request.
    pub async fn delete_unsubscribed(&self, emails: &[String]) -> Result<()> {
        let body = encode(&DeleteUnsubscribedBody { emails })?;
        self.call_for_result(Method::DELETE, "/smtp/unsubscribe", Some(body))
            .await
    }

    /// Lists unsubscribed addresses.
    pub async fn unsubscribed_list(
        &self,
        params: &UnsubscribedListParams,
    ) -> Result<Vec<Unsubscribed>> {
        let path = format!("/smtp/unsubscribe?{}", params.query_string());
        self.call(Method::GET, &path, None).await
    }

    /// IP addresses mail is sent from.
    pub async fn senders_ips(&self) -> Result<Vec<String>> {
        self.call(Method::GET, "/smtp/ips", None).await
    }

    /// Sender addresses allowed to send.
    pub async fn senders_emails(&self) -> Result<Vec<String>> {
        self.call(Method::GET, "/smtp/senders", None).await
    }

    /// Verified sending domains.
    pub async fn allowed_domains(&self) -> Result<Vec<String>> {
        self.call(Method::GET, "/smtp/domains", None).await
    }

    /// Adds a sending domain; SendPulse mails a confirmation to `email`.
    pub async fn add_domain(&self, email: &str) -> Result<()> {
        let body = encode(&DomainBody { email })?;
        self.call_for_result(Method::POST, "/smtp/domains", Some(body))
            .await
    }

    /// Resends the domain verification mail to `email`.
    pub async fn verify_domain(&self, email: &str) -> Result<()> {
        self.call_for_result(Method::GET, &format!("/domains/{}", email), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;
    use crate::transport::{ApiError, MockTransport};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn service(mock: MockTransport) -> SmtpService {
        SmtpService::new(Arc::new(mock))
    }

    fn expect(method: Method, path: &'static str, response: Value) -> MockTransport {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(move |m, p, _, authenticated| *m == method && p == path && *authenticated)
            .times(1)
            .returning(move |_, _, _, _| Ok(response.clone()));
        mock
    }

    fn expect_body(method: Method, path: &'static str, expected: Value, response: Value) -> MockTransport {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(move |m, p, body, _| {
                *m == method && p == path && body.as_ref() == Some(&expected)
            })
            .times(1)
            .returning(move |_, _, _, _| Ok(response.clone()));
        mock
    }

    fn params() -> SendEmailParams {
        SendEmailParams {
            subject: "Welcome".to_string(),
            from: EmailAddress::new("Shop", "shop@example.com"),
            to: EmailAddress::new("Bob", "bob@example.com"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn send_encodes_html_as_base64() {
        let mut params = params();
        params.html = "<h1>Hi</h1>".to_string();

        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|m, p, body, _| {
                let email = &body.as_ref().unwrap()["email"];
                *m == Method::POST
                    && p == "/smtp/emails"
                    && email["html"] == json!("PGgxPkhpPC9oMT4=")
                    && email.get("text").is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"result": true, "id": "msg-1"})));

        let id = service(mock).send(params).await.unwrap();
        assert_eq!(id, "msg-1");
    }

    #[tokio::test]
    async fn send_without_html_leaves_body_untouched() {
        let mut params = params();
        params.text = "plain body".to_string();

        let expected = json!({
            "email": {
                "text": "plain body",
                "template": null,
                "auto_plain_text": false,
                "subject": "Welcome",
                "from": {"name": "Shop", "email": "shop@example.com"},
                "to": {"name": "Bob", "email": "bob@example.com"},
                "attachments": null
            }
        });
        let mock = expect_body(
            Method::POST,
            "/smtp/emails",
            expected,
            json!({"result": true, "id": "msg-2"}),
        );
        assert_eq!(service(mock).send(params).await.unwrap(), "msg-2");
    }

    #[tokio::test]
    async fn list_with_limit() {
        let mock = expect(
            Method::GET,
            "/smtp/emails?offset=0&limit=25",
            json!([{"id": "m1", "recipient": "bob@example.com"}]),
        );
        let params = SmtpListParams {
            limit: Some(25),
            ..Default::default()
        };
        let messages = service(mock).list(&params).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].recipient, "bob@example.com");
    }

    #[tokio::test]
    async fn list_zero_limit_is_omitted() {
        let mock = expect(Method::GET, "/smtp/emails?offset=10", json!(null));
        let params = SmtpListParams {
            limit: Some(0),
            offset: 10,
            ..Default::default()
        };
        assert!(service(mock).list(&params).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn totals() {
        let mock = expect(Method::GET, "/smtp/emails/total", json!({"total": 1200}));
        assert_eq!(service(mock).total().await.unwrap(), 1200);

        let mock = expect(Method::GET, "/smtp/bounces/day/total", json!({"total": 4}));
        assert_eq!(service(mock).total_bounces().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn get_by_id() {
        let mock = expect(
            Method::GET,
            "/smtp/emails/42",
            json!({"id": "42", "subject": "Welcome", "tracking": {"click": 1, "open": 3}}),
        );
        let message = service(mock).get(42).await.unwrap().unwrap();
        assert_eq!(message.subject, "Welcome");
        assert_eq!(message.tracking.open, 3);

        let mock = expect(Method::GET, "/smtp/emails/43", json!(null));
        assert!(service(mock).get(43).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn daily_bounces_date_filter() {
        let mock = expect(
            Method::GET,
            "/smtp/bounces/day?limit=10&offset=0",
            json!({"total": 1, "emails": [{"email_to": "x@example.com", "smtp_answer_code": 550}], "found": 1}),
        );
        let bounces = service(mock).daily_bounces(10, 0, None).await.unwrap();
        assert_eq!(bounces.emails[0].smtp_answer_code, 550);

        let mock = expect(
            Method::GET,
            "/smtp/bounces/day?limit=10&offset=20&date=2024-03-01",
            json!({"total": 0, "emails": null}),
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1);
        let bounces = service(mock).daily_bounces(10, 20, date).await.unwrap();
        assert!(bounces.emails.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_batch_body() {
        let mock = expect_body(
            Method::POST,
            "/smtp/unsubscribe",
            json!({"emails": [
                {"email": "a@example.com", "comment": "asked"},
                {"email": "b@example.com", "comment": ""}
            ]}),
            json!({"result": true}),
        );
        service(mock)
            .unsubscribe(&[
                UnsubscribeEmail::new("a@example.com", "asked"),
                UnsubscribeEmail::new("b@example.com", ""),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_unsubscribed_uses_delete() {
        let mock = expect_body(
            Method::DELETE,
            "/smtp/unsubscribe",
            json!({"emails": ["a@example.com"]}),
            json!({"result": true}),
        );
        service(mock)
            .delete_unsubscribed(&["a@example.com".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unsubscribed_list_query() {
        let mock = expect(
            Method::GET,
            "/smtp/unsubscribe?offset=0&limit=25&date=2024-01-15",
            json!([{"email": "a@example.com", "unsubscribe_by_link": 1, "date": "2024-01-15 10:00:00"}]),
        );
        let params = UnsubscribedListParams {
            limit: Some(25),
            offset: 0,
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
        };
        let list = service(mock).unsubscribed_list(&params).await.unwrap();
        assert_eq!(list[0].unsubscribe_by_link, 1);
        assert!(list[0].date.is_some());
    }

    #[tokio::test]
    async fn sender_and_domain_lists() {
        let mock = expect(Method::GET, "/smtp/ips", json!(["10.0.0.1"]));
        assert_eq!(service(mock).senders_ips().await.unwrap(), vec!["10.0.0.1"]);

        let mock = expect(Method::GET, "/smtp/senders", json!(["shop@example.com"]));
        assert_eq!(
            service(mock).senders_emails().await.unwrap(),
            vec!["shop@example.com"]
        );

        let mock = expect(Method::GET, "/smtp/domains", json!(["example.com"]));
        assert_eq!(service(mock).allowed_domains().await.unwrap(), vec!["example.com"]);
    }

    #[tokio::test]
    async fn domain_lifecycle() {
        let mock = expect_body(
            Method::POST,
            "/smtp/domains",
            json!({"email": "postmaster@example.com"}),
            json!({"result": true}),
        );
        service(mock).add_domain("postmaster@example.com").await.unwrap();

        let mock = expect(
            Method::GET,
            "/domains/postmaster@example.com",
            json!({"result": true}),
        );
        service(mock).verify_domain("postmaster@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn batch_failure_aborts_whole_call() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::Connection("reset by peer".to_string())));

        let result = service(mock)
            .unsubscribe(&[
                UnsubscribeEmail::new("a@example.com", ""),
                UnsubscribeEmail::new("b@example.com", ""),
            ])
            .await;
        assert!(matches!(result, Err(ApiError::Connection(_))));
    }
}
