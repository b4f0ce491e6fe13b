//! 渲染能力
//!
//! 会话只通过 `RendererLauncher` / `PageRenderer` 两个接口使用浏览器，
//! 测试中可以替换成内存实现

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::browser::headless::{launch_headless_browser, BrowserSettings};
use crate::config::Config;
use crate::error::RenderFailure;

/// A4 纸张尺寸（英寸）
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// 把一个 URL 渲染成单个 PDF 文档
#[async_trait]
pub trait PageRenderer: Send {
    async fn render(&mut self, url: &str) -> Result<Vec<u8>, RenderFailure>;

    /// 关闭渲染引擎，释放进程
    async fn shutdown(self: Box<Self>) -> Result<(), RenderFailure>;
}

/// 为每个会话启动一个渲染引擎
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageRenderer>, RenderFailure>;
}

/// 基于 chromiumoxide 的启动器
#[derive(Clone, Debug)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
    settle: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: BrowserSettings::from_config(config),
            settle: config.page_settle(),
        }
    }
}

#[async_trait]
impl RendererLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageRenderer>, RenderFailure> {
        let launched = launch_headless_browser(&self.settings).await?;
        Ok(Box::new(ChromiumRenderer {
            browser: launched.browser,
            page: launched.page,
            handler: launched.handler,
            settle: self.settle,
        }))
    }
}

/// 持有浏览器进程和唯一页面的渲染器
pub struct ChromiumRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    settle: Duration,
}

fn print_params() -> PrintToPdfParams {
    PrintToPdfParams::builder()
        .paper_width(A4_WIDTH_IN)
        .paper_height(A4_HEIGHT_IN)
        .print_background(true)
        .prefer_css_page_size(true)
        .build()
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&mut self, url: &str) -> Result<Vec<u8>, RenderFailure> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| RenderFailure::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| RenderFailure::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        // goto 只等到 load 事件，再给异步请求留一点时间
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }

        self.page
            .pdf(print_params())
            .await
            .map_err(|e| RenderFailure::Print {
                url: url.to_string(),
                source: Box::new(e),
            })
    }

    async fn shutdown(mut self: Box<Self>) -> Result<(), RenderFailure> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        self.handler.abort();

        closed
            .map(|_| ())
            .map_err(|e| RenderFailure::Shutdown(e.to_string()))
    }
}
