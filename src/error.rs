use std::path::PathBuf;

use thiserror::Error;

use crate::document::DecodeError;

/// 应用程序错误类型
///
/// 按处理方式分为五类：
/// - 输入校验错误：立即返回给调用方，不会触发任何外部调用
/// - 外部服务错误：生成阶段记录到单个条目，导出阶段原样返回协作方消息
/// - 文档组装错误：整个文档构建中止，不会产生残缺文档
/// - 文件 / 配置错误：本地 IO 与配置加载
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误
    #[error("输入校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 外部服务错误（消息原样透传）
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// 文档组装错误
    #[error("文档生成失败: {0}")]
    Assembly(#[from] AssemblyError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 邮箱地址格式不正确
    #[error("无效的邮箱地址: '{address}'")]
    InvalidEmail { address: String },
    /// 年龄超出 1-12 范围
    #[error("年龄必须在 1 到 12 之间，实际为 {age}")]
    AgeOutOfRange { age: u32 },
    /// 页数超出 1-10 范围
    #[error("页数必须在 1 到 10 之间，实际为 {count}")]
    PageCountOutOfRange { count: usize },
    /// 主题为空
    #[error("主题描述不能为空")]
    EmptyTheme,
}

/// 外部服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 协作方返回的错误消息
    #[error("{0}")]
    Collaborator(String),
    /// 协作方返回了空结果
    #[error("服务返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
}

/// 文档组装错误
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 没有可导出的页面
    #[error("书中没有任何页面")]
    EmptyBook,
    /// 某一页图片解码失败
    #[error("第 {} 页图片解码失败: {source}", .index + 1)]
    Decode { index: usize, source: DecodeError },
    /// 解码任务异常退出
    #[error("第 {} 页解码任务异常退出: {message}", .index + 1)]
    DecodeTask { index: usize, message: String },
    /// PDF 序列化失败
    #[error("PDF 写入失败: {0}")]
    Pdf(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 解析配置文件失败
    #[error("解析配置文件失败 ({}): {source}", .path.display())]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建协作方错误（消息原样保留）
    pub fn collaborator(message: impl Into<String>) -> Self {
        AppError::Service(ServiceError::Collaborator(message.into()))
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为输入校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        ServiceError::RequestFailed {
            endpoint,
            source: Box::new(err),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Service(err.into())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_message_is_verbatim() {
        let err = AppError::collaborator("Daily sending quota exceeded");
        assert_eq!(err.to_string(), "Daily sending quota exceeded");
    }

    #[test]
    fn decode_error_names_one_based_page() {
        let err = AssemblyError::Decode {
            index: 2,
            source: DecodeError::ZeroSize,
        };
        assert!(err.to_string().starts_with("第 3 页图片解码失败"));
    }

    #[test]
    fn validation_is_detected() {
        let err: AppError = ValidationError::EmptyTheme.into();
        assert!(err.is_validation());
        assert!(!AppError::collaborator("x").is_validation());
    }
}
