//! 日志工具模块
//!
//! 初始化 tracing 订阅者，并提供批次 / 导出过程的格式化输出

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, age: u8) {
    info!("{}", "=".repeat(60));
    info!("🎨 开始生成涂色页: 共 {} 项 (年龄 {})", total, age);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(done: usize, failed: usize, total: usize, cancelled: bool) {
    info!("\n{}", "─".repeat(60));
    if cancelled {
        info!("⏹️ 生成已取消");
    }
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", done, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
