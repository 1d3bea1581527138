//! HTTP 客户端层
//!
//! 只负责请求的拼装与响应解析，不包含业务流程。

pub mod email_client;
pub mod image_client;

pub use email_client::{Attachment, EmailClient, OutgoingEmail};
pub use image_client::{ImageClient, ImageOptions};

use serde_json::Value;
use std::time::Duration;

use crate::error::ServiceError;

/// 构建带超时的 HTTP 客户端
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(ServiceError::from)
}

/// 从错误响应中取出协作方的原始消息
///
/// 兼容 `{"error": {"message": ..}}`、`{"error": ".."}` 和 `{"message": ..}` 三种形态，
/// 都不匹配时返回状态码与原始响应体。
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("error").filter(|e| e.is_string()))
            .or_else(|| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match message {
        Some(msg) if !msg.trim().is_empty() => msg,
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}
