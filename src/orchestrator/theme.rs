//! 主题流程
//!
//! 主题 + 页数 → 场景规划 → 逐页生成。校验失败时不会调用任何外部服务。

use tracing::info;

use super::generation::{CancelFlag, GenerationOrchestrator, GenerationParams, ProgressObserver};
use crate::error::{AppResult, ValidationError};
use crate::logger::truncate_text;
use crate::models::{AgeBand, GenerationBatch, GenerationInput};
use crate::services::illustration::IllustrationService;
use crate::services::scene_planner::{normalize_scenes, ScenePlanner, MAX_PAGES, MIN_PAGES};

/// 主题流程的结果
#[derive(Debug, Clone)]
pub struct ThemeOutcome {
    /// 规划出的场景，与批次条目一一对应
    pub scenes: Vec<String>,
    pub batch: GenerationBatch,
}

/// 校验主题与页数，返回裁剪后的主题
pub fn validate_theme_request(theme: &str, count: usize) -> Result<&str, ValidationError> {
    let theme = theme.trim();
    if theme.is_empty() {
        return Err(ValidationError::EmptyTheme);
    }
    if !(MIN_PAGES..=MAX_PAGES).contains(&count) {
        return Err(ValidationError::PageCountOutOfRange { count });
    }
    Ok(theme)
}

/// 根据主题生成一批涂色页
///
/// 场景规划失败时直接返回错误；之后的逐页失败记录在批次中。
pub async fn generate_from_theme<P, S, O>(
    planner: &P,
    orchestrator: &GenerationOrchestrator<S>,
    theme: &str,
    count: usize,
    age: AgeBand,
    cancel: &CancelFlag,
    observer: &mut O,
) -> AppResult<ThemeOutcome>
where
    P: ScenePlanner,
    S: IllustrationService,
    O: ProgressObserver,
{
    let theme = validate_theme_request(theme, count)?;
    info!("🗺️ 规划场景: \"{}\" × {}", truncate_text(theme, 40), count);

    let planned = planner.plan(theme, count).await?;
    let scenes = normalize_scenes(planned, theme, count);
    for (i, scene) in scenes.iter().enumerate() {
        info!("  场景 {}: {}", i + 1, truncate_text(scene, 60));
    }

    let inputs = scenes
        .iter()
        .cloned()
        .map(GenerationInput::Scene)
        .collect();
    let params = GenerationParams {
        age,
        vary_style: false,
    };
    let batch = orchestrator.run(inputs, &params, cancel, observer).await;

    Ok(ThemeOutcome { scenes, batch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ServiceError};
    use crate::models::{EncodedImage, GenerationStatus};
    use crate::orchestrator::generation::ignore_progress;
    use crate::services::illustration::IllustrationRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPlanner {
        scenes: Vec<String>,
        calls: AtomicUsize,
    }

    impl FixedPlanner {
        fn new(scenes: &[&str]) -> Self {
            Self {
                scenes: scenes.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScenePlanner for FixedPlanner {
        async fn plan(&self, _theme: &str, _count: usize) -> Result<Vec<String>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scenes.clone())
        }
    }

    struct BrokenPlanner;

    impl ScenePlanner for BrokenPlanner {
        async fn plan(&self, _theme: &str, _count: usize) -> Result<Vec<String>, ServiceError> {
            Err(ServiceError::Collaborator("quota exceeded".into()))
        }
    }

    struct EchoService;

    impl IllustrationService for EchoService {
        async fn generate(
            &self,
            request: &IllustrationRequest,
        ) -> Result<EncodedImage, ServiceError> {
            match &request.input {
                GenerationInput::Scene(s) => Ok(EncodedImage::from_bytes(s.clone().into_bytes())),
                GenerationInput::Photo(p) => Ok(p.clone()),
            }
        }
    }

    #[test]
    fn validation_rules() {
        assert_eq!(validate_theme_request("  dinos ", 3), Ok("dinos"));
        assert_eq!(
            validate_theme_request("   ", 3),
            Err(ValidationError::EmptyTheme)
        );
        assert_eq!(
            validate_theme_request("dinos", 0),
            Err(ValidationError::PageCountOutOfRange { count: 0 })
        );
        assert_eq!(
            validate_theme_request("dinos", 11),
            Err(ValidationError::PageCountOutOfRange { count: 11 })
        );
        assert!(validate_theme_request("dinos", 10).is_ok());
    }

    #[tokio::test]
    async fn invalid_request_never_calls_planner() {
        let planner = FixedPlanner::new(&["a"]);
        let orchestrator = GenerationOrchestrator::new(EchoService);

        let err = generate_from_theme(
            &planner,
            &orchestrator,
            "",
            3,
            AgeBand::default(),
            &CancelFlag::new(),
            &mut ignore_progress,
        )
        .await
        .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_plan_is_padded() {
        let planner = FixedPlanner::new(&["a robot chef"]);
        let orchestrator = GenerationOrchestrator::new(EchoService);

        let outcome = generate_from_theme(
            &planner,
            &orchestrator,
            " robots ",
            3,
            AgeBand::default(),
            &CancelFlag::new(),
            &mut ignore_progress,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome.scenes,
            vec![
                "a robot chef",
                "Another scene based on the theme: robots",
                "Another scene based on the theme: robots",
            ]
        );
        assert_eq!(outcome.batch.len(), 3);
        assert_eq!(outcome.batch.count(GenerationStatus::Done), 3);
    }

    #[tokio::test]
    async fn long_plan_is_truncated() {
        let planner = FixedPlanner::new(&["a", "b", "c", "d"]);
        let orchestrator = GenerationOrchestrator::new(EchoService);

        let outcome = generate_from_theme(
            &planner,
            &orchestrator,
            "letters",
            2,
            AgeBand::default(),
            &CancelFlag::new(),
            &mut ignore_progress,
        )
        .await
        .unwrap();

        assert_eq!(outcome.scenes, vec!["a", "b"]);
        assert_eq!(outcome.batch.len(), 2);
    }

    #[tokio::test]
    async fn planner_failure_is_surfaced_verbatim() {
        let orchestrator = GenerationOrchestrator::new(EchoService);
        let err = generate_from_theme(
            &BrokenPlanner,
            &orchestrator,
            "space",
            2,
            AgeBand::default(),
            &CancelFlag::new(),
            &mut ignore_progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Service(_)));
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
