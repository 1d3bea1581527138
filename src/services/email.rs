//! 邮件发送服务
//!
//! [`EmailDelivery`] 接收已经编码好的附件，只负责投递；
//! 地址校验和 PDF 编码由导出层完成。

use std::future::Future;
use tracing::info;

use crate::clients::{Attachment, EmailClient, OutgoingEmail};
use crate::config::Config;
use crate::error::ServiceError;

/// 一次邮件投递请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    pub recipient: String,
    /// base64 编码的 PDF
    pub attachment_base64: String,
    pub filename: String,
    pub subject: String,
}

/// 邮件投递接口
///
/// 失败时返回的 [`ServiceError`] 消息会原样展示给用户。
pub trait EmailDelivery: Send + Sync {
    fn send(&self, request: &EmailRequest) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// 邮件正文
pub fn email_html(title: &str) -> String {
    format!(
        "<p>Here's your coloring book: <strong>{}</strong></p><p>The PDF is attached — print it out and have fun coloring!</p>",
        escape_html(title)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 基于 Resend 接口的实现
pub struct ResendEmailService {
    client: EmailClient,
    from: String,
}

impl ResendEmailService {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            client: EmailClient::new(config)?,
            from: config.email_from.clone(),
        })
    }

    fn build_email(&self, request: &EmailRequest) -> OutgoingEmail {
        OutgoingEmail {
            from: self.from.clone(),
            to: vec![request.recipient.clone()],
            subject: request.subject.clone(),
            html: email_html(&request.subject),
            attachments: vec![Attachment {
                filename: request.filename.clone(),
                content: request.attachment_base64.clone(),
            }],
        }
    }
}

impl EmailDelivery for ResendEmailService {
    async fn send(&self, request: &EmailRequest) -> Result<(), ServiceError> {
        let email = self.build_email(request);
        self.client.send(&email).await?;
        info!("📧 邮件已发送: {} ({})", request.recipient, request.filename);
        Ok(())
    }
}
