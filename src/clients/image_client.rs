/// 图像生成 API 客户端
///
/// 封装 OpenAI 兼容的 `/images/generations`（文生图）与 `/images/edits`（以图生图）调用，
/// 返回解码后的图片字节。
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{error_message, http_client};
use crate::config::Config;
use crate::error::ServiceError;
use crate::models::EncodedImage;

/// 生成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub model: String,
    pub size: String,
    pub quality: String,
}

impl ImageOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.image_model_name.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
        }
    }
}

#[derive(Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

/// 图像 API 客户端
pub struct ImageClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    options: ImageOptions,
}

impl ImageClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(config.request_timeout_secs)?,
            api_key: config.openai_api_key.clone(),
            api_base_url: config.openai_api_base_url.trim_end_matches('/').to_string(),
            options: ImageOptions::from_config(config),
        })
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    /// 根据文字提示生成图片
    pub async fn generate(&self, prompt: &str) -> Result<EncodedImage, ServiceError> {
        let endpoint = format!("{}/images/generations", self.api_base_url);
        debug!("调用图像生成接口，模型: {}", self.options.model);

        let body = GenerationBody {
            model: &self.options.model,
            prompt,
            n: 1,
            size: &self.options.size,
            quality: &self.options.quality,
        };

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        self.read_image(&endpoint, response).await
    }

    /// 以给定照片为底图生成图片
    pub async fn edit(
        &self,
        photo: &EncodedImage,
        prompt: &str,
    ) -> Result<EncodedImage, ServiceError> {
        let endpoint = format!("{}/images/edits", self.api_base_url);
        debug!(
            "调用图像编辑接口，模型: {}, 原图 {} 字节 ({})",
            self.options.model,
            photo.len(),
            photo.media_type()
        );

        let part = Part::bytes(photo.as_bytes().to_vec())
            .file_name(format!("photo.{}", photo.extension()))
            .mime_str(photo.media_type())?;
        let form = Form::new()
            .text("model", self.options.model.clone())
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .text("size", self.options.size.clone())
            .text("quality", self.options.quality.clone())
            .part("image", part);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        self.read_image(&endpoint, response).await
    }

    async fn read_image(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<EncodedImage, ServiceError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!("图像接口返回错误 ({}): {}", status, message);
            return Err(ServiceError::Collaborator(message));
        }

        parse_images_response(endpoint, &text)
    }
}

/// 解析成功响应中的第一张 `b64_json` 图片
fn parse_images_response(endpoint: &str, text: &str) -> Result<EncodedImage, ServiceError> {
    let parsed: ImagesResponse =
        serde_json::from_str(text).map_err(|e| ServiceError::RequestFailed {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })?;

    let b64 = parsed
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::EmptyResponse {
            endpoint: endpoint.to_string(),
        })?;

    EncodedImage::from_base64(&b64).map_err(|e| ServiceError::RequestFailed {
        endpoint: endpoint.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_b64_image() {
        let body = r#"{"created": 1, "data": [{"b64_json": "iVBORw0KGgo="}]}"#;
        let image = parse_images_response("/images/generations", body).unwrap();
        assert_eq!(image.media_type(), "image/png");
    }

    #[test]
    fn empty_data_is_empty_response() {
        let err = parse_images_response("/images/generations", r#"{"data": []}"#).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse { .. }));

        let err =
            parse_images_response("/images/edits", r#"{"data": [{"url": "http://x"}]}"#)
                .unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse { .. }));
    }

    #[test]
    fn malformed_json_is_request_failure() {
        let err = parse_images_response("/images/edits", "<html>").unwrap_err();
        assert!(matches!(err, ServiceError::RequestFailed { .. }));
    }

    #[test]
    fn options_follow_config() {
        let client = ImageClient::new(&Config::default()).unwrap();
        assert_eq!(
            client.options(),
            &ImageOptions {
                model: "gpt-image-1".into(),
                size: "1024x1536".into(),
                quality: "medium".into(),
            }
        );
    }
}
