use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::RenderFailure;

/// 启动无头浏览器所需的参数
#[derive(Clone, Debug)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl BrowserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            executable: config.browser_executable.clone(),
            window_width: config.viewport_width,
            window_height: config.viewport_height,
        }
    }
}

/// 已启动的浏览器，连同后台事件循环
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub page: Page,
    pub handler: JoinHandle<()>,
}

/// 启动无头浏览器并打开一个空白页面
pub async fn launch_headless_browser(settings: &BrowserSettings) -> Result<LaunchedBrowser, RenderFailure> {
    info!("🚀 启动无头浏览器...");

    // 配置无头浏览器
    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .window_size(settings.window_width, settings.window_height)
        .args(vec![
            "--no-sandbox",              // 容器内运行必须禁用沙盒
            "--disable-setuid-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",   // 防止共享内存不足
        ]);
    if let Some(executable) = &settings.executable {
        debug!("浏览器路径: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }
    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        RenderFailure::Launch(e)
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        RenderFailure::Launch(e.to_string())
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            handler.abort();
            return Err(RenderFailure::Launch(format!("创建页面失败: {}", e)));
        }
    };

    info!("✅ 无头浏览器已就绪");
    Ok(LaunchedBrowser {
        browser,
        page,
        handler,
    })
}
