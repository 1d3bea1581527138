//! # Coloring Book
//!
//! 把生成的涂色线稿整理成一本可打印的 PDF，并保存到本地或通过邮件发送
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 书本状态、生成批次、编码图片
//! - `BookState` - 有序页面集合及其修改操作
//! - `GenerationBatch` - 一次生成请求的全部条目
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - HTTP 请求拼装与响应解析
//! - `ImageClient` - 图像生成 / 编辑接口
//! - `EmailClient` - 邮件接口
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个请求
//! - `LlmService` - 对话模型能力
//! - `IllustrationService` - 线稿生成能力
//! - `ScenePlanner` - 场景规划能力
//! - `EmailDelivery` - 邮件投递能力
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/generation` - 顺序生成、失败隔离、取消与进度
//! - `orchestrator/theme` - 主题 → 场景 → 批次
//!
//! ### ⑤ 文档与导出
//! - `document/` - 并发解码、版面规划、PDF 写出
//! - `export` - 本地保存与邮件发送，共用同一份文档字节
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;

// 重新导出常用类型
pub use config::Config;
pub use document::{AssembledDocument, DocumentAssembler};
pub use error::{AppError, AppResult};
pub use export::{ExportDispatcher, ExportReceipt, ExportTarget};
pub use models::{AgeBand, BookState, EncodedImage, GenerationBatch, GenerationInput};
pub use orchestrator::{CancelFlag, GenerationOrchestrator, GenerationParams, ProgressEvent};
