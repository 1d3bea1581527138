use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- OpenAI 兼容接口配置 ---
    pub openai_api_key: String,
    pub openai_api_base_url: String,
    /// 场景规划 / 照片描述使用的对话模型
    pub chat_model_name: String,
    /// 线稿生成使用的图像模型
    pub image_model_name: String,
    pub image_size: String,
    pub image_quality: String,
    // --- 邮件服务配置 ---
    pub resend_api_key: String,
    pub resend_api_base_url: String,
    pub email_from: String,
    /// 本地导出目录
    pub output_dir: String,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_api_base_url: "https://api.openai.com/v1".to_string(),
            chat_model_name: "gpt-4o".to_string(),
            image_model_name: "gpt-image-1".to_string(),
            image_size: "1024x1536".to_string(),
            image_quality: "medium".to_string(),
            resend_api_key: String::new(),
            resend_api_base_url: "https://api.resend.com".to_string(),
            email_from: "Coloring Book <onboarding@resend.dev>".to_string(),
            output_dir: "output".to_string(),
            request_timeout_secs: 180,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 只从环境变量加载，未设置的字段使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再叠加环境变量
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        config.with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: env_string("OPENAI_API_KEY").unwrap_or(self.openai_api_key),
            openai_api_base_url: env_string("OPENAI_API_BASE_URL")
                .unwrap_or(self.openai_api_base_url),
            chat_model_name: env_string("CHAT_MODEL_NAME").unwrap_or(self.chat_model_name),
            image_model_name: env_string("IMAGE_MODEL_NAME").unwrap_or(self.image_model_name),
            image_size: env_string("IMAGE_SIZE").unwrap_or(self.image_size),
            image_quality: env_string("IMAGE_QUALITY").unwrap_or(self.image_quality),
            resend_api_key: env_string("RESEND_API_KEY").unwrap_or(self.resend_api_key),
            resend_api_base_url: env_string("RESEND_API_BASE_URL")
                .unwrap_or(self.resend_api_base_url),
            email_from: env_string("RESEND_FROM_EMAIL").unwrap_or(self.email_from),
            output_dir: env_string("OUTPUT_DIR").unwrap_or(self.output_dir),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            verbose_logging: env_parsed("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(
    name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_image_api_settings() {
        let config = Config::default();
        assert_eq!(config.image_model_name, "gpt-image-1");
        assert_eq!(config.image_size, "1024x1536");
        assert_eq!(config.image_quality, "medium");
        assert_eq!(config.output_dir, "output");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chat_model_name = \"gpt-4o-mini\"").unwrap();
        writeln!(file, "request_timeout_secs = 30").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.chat_model_name, "gpt-4o-mini");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.image_model_name, "gpt-image-1");
    }

    #[test]
    fn malformed_toml_is_reported_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = \"soon\"").unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }
}
