use anyhow::{Context, Result};
use pdf_batch_merge::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置，命令行第一个参数覆盖 TARGET_URL
    let mut config = Config::from_env();
    if let Some(url) = std::env::args().nth(1) {
        config.target_url = Some(url);
    }
    let target_url = config
        .target_url
        .clone()
        .context("缺少目标 URL：请通过命令行参数或 TARGET_URL 环境变量提供")?;

    // 初始化并运行应用
    App::initialize(config).await?.run(&target_url).await?;

    Ok(())
}
