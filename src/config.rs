use std::path::PathBuf;
use std::time::Duration;

/// 每批合并的 PDF 数量上限
///
/// 同一时刻最多只有这么多个源文档被加载到内存中
pub const BATCH_CAPACITY: usize = 50;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 目标课程 URL（命令行参数优先）
    pub target_url: Option<String>,
    /// 模块列表查询 API
    pub lookup_api_url: String,
    /// 最终 PDF 的输出目录
    pub output_dir: PathBuf,
    /// 浏览器可执行文件路径（为空时由 chromiumoxide 自动查找）
    pub browser_executable: Option<PathBuf>,
    /// 查询 API 的超时时间（秒）
    pub lookup_timeout_secs: u64,
    /// 单个页面渲染的超时时间（秒）
    pub render_timeout_secs: u64,
    /// 页面加载完成后额外等待网络空闲的时间（毫秒）
    pub page_settle_ms: u64,
    /// 同时处理的会话数量
    pub max_concurrent_sessions: usize,
    // --- 浏览器窗口 ---
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: None,
            lookup_api_url: "https://ml2pdf-web-api.azurewebsites.net/api".to_string(),
            output_dir: PathBuf::from("."),
            browser_executable: None,
            lookup_timeout_secs: 30,
            render_timeout_secs: 60,
            page_settle_ms: 500,
            max_concurrent_sessions: 4,
            viewport_width: 1280,
            viewport_height: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            target_url: std::env::var("TARGET_URL").ok().or(default.target_url),
            lookup_api_url: std::env::var("LOOKUP_API_URL").unwrap_or(default.lookup_api_url),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            browser_executable: std::env::var("BROWSER_EXECUTABLE").ok().map(PathBuf::from).or(default.browser_executable),
            lookup_timeout_secs: std::env::var("LOOKUP_TIMEOUT_SECS").ok().and_then(|v| v.parse::<u64>().ok()).filter(|v| *v > 0).unwrap_or(default.lookup_timeout_secs),
            render_timeout_secs: std::env::var("RENDER_TIMEOUT_SECS").ok().and_then(|v| v.parse::<u64>().ok()).filter(|v| *v > 0).unwrap_or(default.render_timeout_secs),
            page_settle_ms: std::env::var("PAGE_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_settle_ms),
            max_concurrent_sessions: std::env::var("MAX_CONCURRENT_SESSIONS").ok().and_then(|v| v.parse::<usize>().ok()).filter(|v| *v > 0).unwrap_or(default.max_concurrent_sessions),
            viewport_width: std::env::var("VIEWPORT_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.viewport_width),
            viewport_height: std::env::var("VIEWPORT_HEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.viewport_height),
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}
