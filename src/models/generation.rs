//! 生成批次相关的数据结构

use std::fmt;

use crate::error::ValidationError;
use crate::models::EncodedImage;

/// 孩子的年龄段（1-12 岁），决定线稿的复杂程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AgeBand(u8);

impl AgeBand {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 12;

    pub fn new(age: u32) -> Result<Self, ValidationError> {
        if (Self::MIN as u32..=Self::MAX as u32).contains(&age) {
            Ok(Self(age as u8))
        } else {
            Err(ValidationError::AgeOutOfRange { age })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn complexity(self) -> Complexity {
        match self.0 {
            0..=4 => Complexity::Simple,
            5..=7 => Complexity::Medium,
            _ => Complexity::Detailed,
        }
    }
}

impl Default for AgeBand {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 岁", self.0)
    }
}

/// 线稿复杂度档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Detailed,
}

impl Complexity {
    /// 拼接进图像生成提示词的风格描述
    pub fn prompt(self) -> &'static str {
        match self {
            Complexity::Simple => "very simple coloring page for toddlers: large bold outlines, thick lines, very few elements, big simple shapes, no fine detail",
            Complexity::Medium => "medium complexity coloring page for young children: moderate detail, clear outlines, some smaller elements but still easy to color, medium-thick lines",
            Complexity::Detailed => "detailed coloring page for older children: fine lines, complex scene with many elements, intricate patterns and details, thin clean outlines",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Complexity::Simple => "Simple",
            Complexity::Medium => "Medium",
            Complexity::Detailed => "Detailed",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Complexity::Simple => "Large shapes, thick lines, few elements",
            Complexity::Medium => "Moderate detail, some small elements",
            Complexity::Detailed => "Fine lines, complex scenes, many elements",
        }
    }
}

/// 一个批次条目的输入：场景描述或一张照片
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationInput {
    Scene(String),
    Photo(EncodedImage),
}

impl GenerationInput {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationInput::Scene(_) => "场景",
            GenerationInput::Photo(_) => "照片",
        }
    }
}

/// 条目状态，只允许 Pending → InProgress → Done | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl GenerationStatus {
    pub fn is_resolved(self) -> bool {
        matches!(self, GenerationStatus::Done | GenerationStatus::Failed)
    }
}

/// 批次中的单个生成条目
#[derive(Debug, Clone)]
pub struct GenerationItem {
    pub source: GenerationInput,
    status: GenerationStatus,
    result_image: Option<EncodedImage>,
    error_message: Option<String>,
}

impl GenerationItem {
    pub fn new(source: GenerationInput) -> Self {
        Self {
            source,
            status: GenerationStatus::Pending,
            result_image: None,
            error_message: None,
        }
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn result_image(&self) -> Option<&EncodedImage> {
        self.result_image.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.status, GenerationStatus::Pending);
        self.status = GenerationStatus::InProgress;
    }

    pub(crate) fn succeed(&mut self, image: EncodedImage) {
        debug_assert_eq!(self.status, GenerationStatus::InProgress);
        self.status = GenerationStatus::Done;
        self.result_image = Some(image);
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        debug_assert_eq!(self.status, GenerationStatus::InProgress);
        self.status = GenerationStatus::Failed;
        self.error_message = Some(message.into());
    }
}

/// 一次用户请求对应的完整生成批次
///
/// 长度固定等于输入数量，顺序即输入顺序。
#[derive(Debug, Clone)]
pub struct GenerationBatch {
    items: Vec<GenerationItem>,
}

impl GenerationBatch {
    pub fn new(inputs: Vec<GenerationInput>) -> Self {
        Self {
            items: inputs.into_iter().map(GenerationItem::new).collect(),
        }
    }

    pub fn items(&self) -> &[GenerationItem] {
        &self.items
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> &mut GenerationItem {
        &mut self.items[index]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: GenerationStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn done_count(&self) -> usize {
        self.count(GenerationStatus::Done)
    }

    pub fn failed_count(&self) -> usize {
        self.count(GenerationStatus::Failed)
    }

    /// 按批次顺序返回所有成功生成的图片
    pub fn successful_images(&self) -> impl Iterator<Item = &EncodedImage> {
        self.items.iter().filter_map(GenerationItem::result_image)
    }
}
