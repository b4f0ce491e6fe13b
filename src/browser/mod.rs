//! 浏览器层
//!
//! - `headless` - 启动无头浏览器
//! - `renderer` - 渲染能力接口及 chromiumoxide 实现

pub mod headless;
pub mod renderer;

pub use headless::{launch_headless_browser, BrowserSettings};
pub use renderer::{ChromiumLauncher, ChromiumRenderer, PageRenderer, RendererLauncher};
