/// 邮件 API 客户端
///
/// 封装 Resend 兼容的 `POST /emails` 调用。附件内容由调用方提前编码为 base64。
use serde::Serialize;
use tracing::{debug, warn};

use super::{error_message, http_client};
use crate::config::Config;
use crate::error::ServiceError;

/// 待发送的邮件
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    /// base64 编码的文件内容
    pub content: String,
}

/// 邮件 API 客户端
pub struct EmailClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
}

impl EmailClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(config.request_timeout_secs)?,
            api_key: config.resend_api_key.clone(),
            api_base_url: config.resend_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 发送邮件
    ///
    /// 非 2xx 响应转为 [`ServiceError::Collaborator`]，消息取自响应体原文。
    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::Collaborator(
                "Email service not configured. Set RESEND_API_KEY.".to_string(),
            ));
        }

        let endpoint = format!("{}/emails", self.api_base_url);
        debug!("发送邮件到 {:?}，附件 {} 个", email.to, email.attachments.len());

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("邮件接口调用成功");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        warn!("邮件接口返回错误 ({}): {}", status, message);
        Err(ServiceError::Collaborator(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_resend_payload() {
        let email = OutgoingEmail {
            from: "Coloring Book <onboarding@resend.dev>".into(),
            to: vec!["kid@example.com".into()],
            subject: "Dinosaurs".into(),
            html: "<p>hi</p>".into(),
            attachments: vec![Attachment {
                filename: "dinosaurs.pdf".into(),
                content: "JVBERi0=".into(),
            }],
        };
        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["to"][0], "kid@example.com");
        assert_eq!(value["attachments"][0]["filename"], "dinosaurs.pdf");
        assert_eq!(value["attachments"][0]["content"], "JVBERi0=");
    }

    #[test]
    fn missing_api_key_fails_without_request() {
        let client = EmailClient::new(&Config::default()).unwrap();
        let email = OutgoingEmail {
            from: String::new(),
            to: vec!["a@b.co".into()],
            subject: String::new(),
            html: String::new(),
            attachments: Vec::new(),
        };
        let err = tokio_test::block_on(client.send(&email)).unwrap_err();
        assert!(err.to_string().contains("RESEND_API_KEY"));
    }
}
