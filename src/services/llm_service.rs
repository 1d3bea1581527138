//! LLM 服务 - 业务能力层
//!
//! 只负责"对话模型"能力：场景规划的原始对话、照片描述、随机主题。
//! 不关心生成流程。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（兼容 OpenAI API 的服务）

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::logger::truncate_text;
use crate::models::EncodedImage;

const PHOTO_ANALYSIS_PROMPT: &str = "Describe the main subjects and scene in this family photo in 2-3 sentences. Focus on the people, their activities, and the setting. Be specific but concise.";
pub const DEFAULT_PHOTO_DESCRIPTION: &str = "a family scene";

const SURPRISE_SYSTEM_PROMPT: &str = "You generate creative, fun, imaginative coloring book themes for kids. Respond with ONLY the theme — a short phrase (3-8 words) in sentence case (only capitalize the first word), no quotes, no punctuation, no explanation.";
const SURPRISE_USER_PROMPT: &str = "Give me a random fun coloring book theme for kids.";
pub const DEFAULT_SURPRISE_THEME: &str = "animals on a space adventure";

/// 单次对话的采样参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: 1024,
        }
    }
}

fn llm_error(err: OpenAIError) -> ServiceError {
    match err {
        OpenAIError::ApiError(api) => ServiceError::Collaborator(api.message),
        other => ServiceError::RequestFailed {
            endpoint: "/chat/completions".to_string(),
            source: Box::new(other),
        },
    }
}

/// LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.chat_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `images`: 附带的图片（可选），以 data URL 形式追加到用户消息
    /// - `options`: 采样参数
    ///
    /// # 返回
    /// 模型回复的文本；回复为空时返回 `Ok(None)`
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        images: &[EncodedImage],
        options: ChatOptions,
    ) -> Result<Option<String>, ServiceError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息: {}", truncate_text(user_message, 80));

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(llm_error)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(llm_error)?
        } else {
            let mut content_parts = vec![ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            )];
            for image in images {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ));
            }
            debug!("使用 Vision API，包含 {} 张图片", images.len());

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(llm_error)?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model_name)
            .messages(messages)
            .max_tokens(options.max_tokens);
        if let Some(temperature) = options.temperature {
            request.temperature(temperature);
        }
        let request = request.build().map_err(llm_error)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            llm_error(e)
        })?;

        debug!("LLM API 调用成功");

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string()))
    }

    /// 描述照片内容，作为线稿生成的场景上下文
    ///
    /// 模型没有返回内容时使用 [`DEFAULT_PHOTO_DESCRIPTION`]。
    pub async fn describe_photo(&self, photo: &EncodedImage) -> Result<String, ServiceError> {
        let options = ChatOptions {
            temperature: None,
            max_tokens: 300,
        };
        let description = self
            .send_to_llm(PHOTO_ANALYSIS_PROMPT, None, std::slice::from_ref(photo), options)
            .await?;

        Ok(description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_PHOTO_DESCRIPTION.to_string()))
    }

    /// 生成一个随机主题
    ///
    /// 调用失败或回复为空时返回 [`DEFAULT_SURPRISE_THEME`]，不会报错。
    pub async fn surprise_theme(&self) -> String {
        let options = ChatOptions {
            temperature: Some(1.2),
            max_tokens: 60,
        };
        match self
            .send_to_llm(SURPRISE_USER_PROMPT, Some(SURPRISE_SYSTEM_PROMPT), &[], options)
            .await
        {
            Ok(reply) => clean_theme(reply.as_deref()),
            Err(e) => {
                warn!("随机主题生成失败，使用默认主题: {}", e);
                DEFAULT_SURPRISE_THEME.to_string()
            }
        }
    }
}

/// 去掉模型偶尔加上的引号与句末标点
fn clean_theme(reply: Option<&str>) -> String {
    let theme = reply
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '!')
        .trim();

    if theme.is_empty() {
        DEFAULT_SURPRISE_THEME.to_string()
    } else {
        theme.to_string()
    }
}
