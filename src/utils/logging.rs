/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::PersistedDocument;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 课程页面批量转 PDF");
    info!("🔗 查询 API: {}", config.lookup_api_url);
    info!("📂 输出目录: {}", config.output_dir.display());
    info!("📊 最大并发会话数: {}", config.max_concurrent_sessions);
    info!("{}", "=".repeat(60));
}

/// 打印单次请求的结果
pub fn print_result(target_url: &str, document: &PersistedDocument) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔗 来源: {}", truncate_text(target_url, 80));
    info!("📄 页数: {}", document.page_count);
    info!("✅ 文件: {}", document.path.display());
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
