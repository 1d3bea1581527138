//! 业务能力层
//!
//! 每个服务只提供一种外部能力（对话、线稿、场景规划、邮件），不关心流程。
//! 编排层通过 trait 依赖它们，测试中替换为模拟实现。

pub mod email;
pub mod illustration;
pub mod llm_service;
pub mod scene_planner;

pub use email::{EmailDelivery, EmailRequest, ResendEmailService};
pub use illustration::{IllustrationRequest, IllustrationService, OpenAiIllustrationService};
pub use llm_service::LlmService;
pub use scene_planner::{LlmScenePlanner, ScenePlanner};
