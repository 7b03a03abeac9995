//! Mailjet Send API v3.1 via REST (no SDK dependency)

use reqwest::StatusCode;
use serde_json::json;
use shared::error::{AppError, ErrorCode};

use super::OutgoingEmail;

const SEND_URL: &str = "https://api.mailjet.com/v3.1/send";

#[derive(Clone)]
pub struct MailjetClient {
    http: reqwest::Client,
    api_key: String,
    secret_key: String,
    from_email: String,
    from_name: String,
}

impl MailjetClient {
    pub fn new(api_key: String, secret_key: String, from_email: String, from_name: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            secret_key,
            from_email,
            from_name,
        }
    }

    fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        json!({
            "Messages": [{
                "From": { "Email": self.from_email, "Name": self.from_name },
                "To": [{ "Email": email.to_email, "Name": email.to_name }],
                "Subject": email.subject,
                "TextPart": email.text,
            }]
        })
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let resp = self
            .http
            .post(SEND_URL)
            .basic_auth(&self.api_key, Some(&self.secret_key))
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::EmailSendFailed,
                    format!("Mailjet request failed: {e}"),
                )
            })?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        check_response(status, &body)
    }
}

/// Mailjet answers per message; the send only counts when the first message succeeded
fn check_response(status: StatusCode, body: &serde_json::Value) -> Result<(), AppError> {
    let accepted = body["Messages"][0]["Status"].as_str() == Some("success");
    if status.is_success() && accepted {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::EmailSendFailed,
        format!("Mailjet rejected the message ({status})"),
    )
    .with_detail("response", body.clone()))
}
