//! 场景规划服务
//!
//! 把一个主题展开成若干条互不相同的场景描述。模型的回复不可信：
//! 先用正则截出 JSON 数组，解析失败时整体回退为占位场景，最后补齐 / 截断到请求的数量。

use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::services::llm_service::{ChatOptions, LlmService};

pub const MIN_PAGES: usize = 1;
pub const MAX_PAGES: usize = 10;

const PLANNER_SYSTEM_PROMPT: &str = "You are a creative children's coloring book designer. Given a theme, generate unique scene descriptions for coloring book pages. Each scene should be distinct and varied while staying on theme. Return ONLY a JSON array of strings, no other text.";

/// 场景规划接口
///
/// 实现只需返回模型给出的场景；数量修正由 [`normalize_scenes`] 负责。
pub trait ScenePlanner: Send + Sync {
    fn plan(
        &self,
        theme: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;
}

fn json_array_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[[\s\S]*\]").ok())
        .as_ref()
}

pub fn planner_user_prompt(theme: &str, count: usize) -> String {
    format!(
        "Theme: \"{theme}\"\n\nGenerate exactly {count} unique, vivid scene descriptions for coloring book pages based on this theme. Each scene should be different (different characters, settings, activities, or perspectives). Return a JSON array of {count} strings."
    )
}

/// 从模型回复中解析场景列表
///
/// 没有找到数组时返回空列表（之后由补齐逻辑填充）；
/// 找到但无法解析时返回 `None`，调用方应使用编号占位场景。
pub fn parse_scene_list(reply: &str) -> Option<Vec<String>> {
    let Some(found) = json_array_pattern().and_then(|re| re.find(reply)) else {
        return Some(Vec::new());
    };
    serde_json::from_str::<Vec<String>>(found.as_str()).ok()
}

/// 编号占位场景："Scene i based on the theme: <theme>"
pub fn placeholder_scenes(theme: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| format!("Scene {} based on the theme: {}", i, theme))
        .collect()
}

/// 补齐或截断到恰好 `count` 条
pub fn normalize_scenes(mut scenes: Vec<String>, theme: &str, count: usize) -> Vec<String> {
    if scenes.len() < count {
        let filler = format!("Another scene based on the theme: {}", theme);
        scenes.resize(count, filler);
    }
    scenes.truncate(count);
    scenes
}

/// 基于对话模型的场景规划
pub struct LlmScenePlanner {
    llm: LlmService,
}

impl LlmScenePlanner {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }
}

impl ScenePlanner for LlmScenePlanner {
    async fn plan(&self, theme: &str, count: usize) -> Result<Vec<String>, ServiceError> {
        let options = ChatOptions {
            temperature: Some(1.0),
            max_tokens: 1000,
        };
        let reply = self
            .llm
            .send_to_llm(
                &planner_user_prompt(theme, count),
                Some(PLANNER_SYSTEM_PROMPT),
                &[],
                options,
            )
            .await?
            .unwrap_or_else(|| "[]".to_string());

        match parse_scene_list(&reply) {
            Some(scenes) => {
                debug!("模型返回 {} 个场景", scenes.len());
                Ok(scenes)
            }
            None => {
                warn!("无法解析场景列表，使用占位场景");
                Ok(placeholder_scenes(theme, count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_surrounded_by_prose() {
        let reply = "Sure! Here you go:\n```json\n[\"a fox\", \"a bear\"]\n```";
        assert_eq!(
            parse_scene_list(reply),
            Some(vec!["a fox".to_string(), "a bear".to_string()])
        );
    }

    #[test]
    fn no_array_means_empty_list() {
        assert_eq!(parse_scene_list("I cannot help with that"), Some(Vec::new()));
    }

    #[test]
    fn malformed_array_is_none() {
        assert_eq!(parse_scene_list("[\"a fox\", 3, ]"), None);
    }

    #[test]
    fn pads_short_lists() {
        let scenes = normalize_scenes(vec!["one".into()], "pirates", 3);
        assert_eq!(
            scenes,
            vec![
                "one",
                "Another scene based on the theme: pirates",
                "Another scene based on the theme: pirates",
            ]
        );
    }

    #[test]
    fn truncates_long_lists() {
        let scenes = normalize_scenes(vec!["a".into(), "b".into(), "c".into()], "x", 2);
        assert_eq!(scenes, vec!["a", "b"]);
    }

    #[test]
    fn placeholders_are_numbered_from_one() {
        assert_eq!(
            placeholder_scenes("bugs", 2),
            vec![
                "Scene 1 based on the theme: bugs",
                "Scene 2 based on the theme: bugs"
            ]
        );
    }

    #[test]
    fn user_prompt_mentions_count_twice() {
        let prompt = planner_user_prompt("ocean", 4);
        assert!(prompt.starts_with("Theme: \"ocean\"\n\n"));
        assert!(prompt.contains("Generate exactly 4 unique"));
        assert!(prompt.ends_with("Return a JSON array of 4 strings."));
    }
}
