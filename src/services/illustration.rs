//! 线稿生成服务
//!
//! [`IllustrationService`] 是生成编排器唯一依赖的外部能力：输入一个场景描述或一张照片，
//! 返回一张涂色线稿。提示词拼装是纯函数，OpenAI 实现只负责把它们发出去。

use std::future::Future;
use tracing::debug;

use crate::clients::ImageClient;
use crate::config::Config;
use crate::error::ServiceError;
use crate::logger::truncate_text;
use crate::models::{AgeBand, EncodedImage, GenerationInput};
use crate::services::llm_service::LlmService;

/// 风格变体，按条目序号循环选取
pub const VARIANT_STYLES: [&str; 6] = [
    "faithful recreation of the scene",
    "whimsical cartoon interpretation",
    "storybook illustration style",
    "playful chibi/cute style",
    "nature-themed decorative border around the scene",
    "comic book panel style",
];

const LINE_ART_RULES: &str = "The image must be pure black outlines on a white background, no shading, no gray tones, no color — only clean line art suitable for coloring in with crayons.";
const FILL_FRAME: &str = "Fill the entire frame with the artwork — no large empty margins.";

/// 单次生成请求
#[derive(Debug, Clone)]
pub struct IllustrationRequest {
    pub input: GenerationInput,
    pub age: AgeBand,
    /// 需要风格变体时为条目序号
    pub variant_index: Option<usize>,
}

impl IllustrationRequest {
    pub fn style(&self) -> Option<&'static str> {
        self.variant_index.map(style_variant)
    }
}

/// 线稿生成接口
pub trait IllustrationService: Send + Sync {
    fn generate(
        &self,
        request: &IllustrationRequest,
    ) -> impl Future<Output = Result<EncodedImage, ServiceError>> + Send;
}

/// 第 `index` 个条目使用的风格
pub fn style_variant(index: usize) -> &'static str {
    VARIANT_STYLES[index % VARIANT_STYLES.len()]
}

/// 场景 → 线稿提示词
pub fn scene_prompt(scene: &str, age: AgeBand, style: Option<&str>) -> String {
    let approach = style
        .map(|s| format!(" Artistic approach: {}.", s))
        .unwrap_or_default();
    format!(
        "Create a black and white coloring book page. Scene: {}. Style: {}.{} {}",
        scene,
        age.complexity().prompt(),
        approach,
        LINE_ART_RULES
    )
}

/// 照片 → 线稿提示词
///
/// 照片条目总是带风格，未要求变体时使用第一个风格。
pub fn photo_prompt(description: &str, age: AgeBand, style: Option<&str>) -> String {
    format!(
        "Convert this photo into a black and white coloring book page. Scene context: {}. Style: {}. Artistic approach: {}. {} Preserve the composition, poses, and key details of the original photo. {}",
        description,
        age.complexity().prompt(),
        style.unwrap_or(VARIANT_STYLES[0]),
        LINE_ART_RULES,
        FILL_FRAME
    )
}

/// 基于 OpenAI 图像接口的实现
///
/// 照片条目先由对话模型描述画面，再以原图为底图生成。
pub struct OpenAiIllustrationService {
    images: ImageClient,
    llm: LlmService,
}

impl OpenAiIllustrationService {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            images: ImageClient::new(config)?,
            llm: LlmService::new(config),
        })
    }
}

impl IllustrationService for OpenAiIllustrationService {
    async fn generate(&self, request: &IllustrationRequest) -> Result<EncodedImage, ServiceError> {
        match &request.input {
            GenerationInput::Scene(scene) => {
                let prompt = scene_prompt(scene, request.age, request.style());
                debug!("场景提示词: {}", truncate_text(&prompt, 120));
                self.images.generate(&prompt).await
            }
            GenerationInput::Photo(photo) => {
                let description = self.llm.describe_photo(photo).await?;
                debug!("照片描述: {}", truncate_text(&description, 120));
                let prompt = photo_prompt(&description, request.age, request.style());
                self.images.edit(photo, &prompt).await
            }
        }
    }
}
