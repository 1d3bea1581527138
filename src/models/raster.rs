//! 编码后的栅格图片
//!
//! 页面、生成结果和文档组装之间传递的都是同一份字节，
//! 用 `Arc<[u8]>` 共享，克隆不复制像素数据。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;

/// 编码后的图片（PNG / JPEG / WebP 原始字节）
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage(Arc<[u8]>);

impl EncodedImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    /// 解析 base64 字符串，兼容 `data:image/png;base64,` 前缀
    pub fn from_base64(data: &str) -> Result<Self, base64::DecodeError> {
        let payload = match data.split_once(',') {
            Some((_, rest)) => rest,
            None => data,
        };
        Ok(Self::from_bytes(STANDARD.decode(payload.trim())?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 根据文件头判断媒体类型，无法识别时按 JPEG 处理
    pub fn media_type(&self) -> &'static str {
        let bytes = self.as_bytes();
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            "image/png"
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            "image/webp"
        } else {
            "image/jpeg"
        }
    }

    /// 媒体类型对应的文件扩展名
    pub fn extension(&self) -> &'static str {
        match self.media_type() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.as_bytes())
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.to_base64())
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedImage({}, {} bytes)", self.media_type(), self.len())
    }
}

impl From<Vec<u8>> for EncodedImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}
