/// 日志工具模块
///
/// 初始化 tracing，并提供运行横幅等输出辅助函数
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则 verbose 时为 debug，默认 info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 音乐合伙人自动评定 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🍪 MUSIC_U: {}", mask_secret(&config.music_u, 10));
    info!(
        "⏱️ 随机等待: {}~{} 秒, 频率限制最多重试 {} 次",
        config.wait_time_min, config.wait_time_max, config.max_rate_limit_retries
    );
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始
pub fn log_section(title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("{}", title);
    info!("{}", "─".repeat(60));
}

/// 记录最终结果
pub fn log_run_result(success: bool) {
    info!("\n{}", "=".repeat(60));
    if success {
        info!("✅ 执行成功");
    } else {
        error!("❌ 执行失败");
    }
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 只保留前 `visible` 个字符，其余隐藏
pub fn mask_secret(secret: &str, visible: usize) -> String {
    if secret.chars().count() <= visible {
        "*".repeat(secret.chars().count())
    } else {
        secret.chars().take(visible).collect::<String>() + "...（已隐藏）"
    }
}
