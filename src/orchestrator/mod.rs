//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责流程调度，不做具体的生成或网络调用。
//!
//! ### `generation` - 生成编排器
//! - 逐项调用线稿服务，记录每项状态
//! - 单项失败不中断批次
//! - 协作式取消与进度通知
//!
//! ### `theme` - 主题流程
//! - 校验主题与页数
//! - 场景规划 → 补齐 / 截断 → 生成批次
//!
//! ## 层次关系
//!
//! ```text
//! theme (主题 → Vec<场景>)
//!     ↓
//! generation (Vec<GenerationInput> → GenerationBatch)
//!     ↓
//! services (能力层：illustration / scene_planner)
//!     ↓
//! clients (HTTP)
//! ```

pub mod generation;
pub mod theme;

pub use generation::{
    ignore_progress, CancelFlag, GenerationOrchestrator, GenerationParams, ProgressEvent,
    ProgressObserver,
};
pub use theme::{generate_from_theme, validate_theme_request, ThemeOutcome};
