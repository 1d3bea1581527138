use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use coloring_book::export::ExportTarget;
use coloring_book::logger;
use coloring_book::orchestrator::{generate_from_theme, CancelFlag, GenerationOrchestrator, ProgressEvent};
use coloring_book::services::{
    LlmScenePlanner, LlmService, OpenAiIllustrationService, ResendEmailService,
};
use coloring_book::{AgeBand, BookState, Config, DocumentAssembler, ExportDispatcher};

const DEFAULT_PAGE_COUNT: usize = 4;

/// 用法: coloring_book [主题] [页数] [年龄]
///
/// 未给出主题时由模型随机生成一个。设置 `EMAIL_TO` 时额外发送邮件。
#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("COLORING_BOOK_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)
            .with_context(|| format!("无法加载配置文件: {}", path))?,
        Err(_) => Config::from_env().context("无法从环境变量加载配置")?,
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    let mut args = std::env::args().skip(1);
    let theme_arg = args.next();
    let count = match args.next() {
        Some(n) => n.parse().with_context(|| format!("页数无效: {}", n))?,
        None => DEFAULT_PAGE_COUNT,
    };
    let age = match args.next() {
        Some(a) => AgeBand::new(a.parse().with_context(|| format!("年龄无效: {}", a))?)?,
        None => AgeBand::default(),
    };

    let llm = LlmService::new(&config);
    let theme = match theme_arg {
        Some(theme) => theme,
        None => {
            let theme = llm.surprise_theme().await;
            info!("🎲 随机主题: {}", theme);
            theme
        }
    };

    let planner = LlmScenePlanner::new(llm);
    let orchestrator = GenerationOrchestrator::new(OpenAiIllustrationService::new(&config)?);

    // Ctrl-C 只阻止后续页面开始，当前页面会正常结束
    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到中断信号，当前页面完成后停止");
            signal_flag.cancel();
        }
    });

    let mut report = |event: ProgressEvent| info!("📈 {}", event.phase);
    let outcome = generate_from_theme(
        &planner,
        &orchestrator,
        &theme,
        count,
        age,
        &cancel,
        &mut report,
    )
    .await?;

    let mut book = BookState::new();
    book.set_age(age);
    book.set_title(theme.trim());
    let added = book.extend_from_batch(&outcome.batch);
    if added == 0 {
        anyhow::bail!("没有成功生成任何页面");
    }

    let document = DocumentAssembler::new()
        .assemble(&book.selected_images(), Some(book.title()))
        .await?;

    let mut targets = vec![ExportTarget::Local {
        dir: PathBuf::from(&config.output_dir),
    }];
    if let Ok(recipient) = std::env::var("EMAIL_TO") {
        targets.push(ExportTarget::Email {
            recipient: recipient.trim().to_string(),
        });
    }

    let dispatcher = ExportDispatcher::new(ResendEmailService::new(&config)?);
    for receipt in dispatcher.dispatch(&document, book.title(), &targets).await? {
        info!("✅ {:?}", receipt);
    }

    Ok(())
}
