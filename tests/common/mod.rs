//! 集成测试共用的假依赖
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pdf_batch_merge::error::{LookupError, RenderFailure};
use pdf_batch_merge::{Config, PageLookup, PageRenderer, RendererLauncher, SessionContext, SessionEvent};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

/// 返回固定 JSON 的查询；`None` 模拟 API 返回 503
pub struct FakeLookup {
    pub response: Option<Value>,
}

#[async_trait]
impl PageLookup for FakeLookup {
    async fn lookup(&self, _target_url: &str) -> Result<Value, LookupError> {
        self.response.clone().ok_or_else(|| LookupError::BadStatus {
            endpoint: "http://lookup.test/api".to_string(),
            status: 503,
        })
    }
}

/// 记录启动/关闭次数的假浏览器
#[derive(Default)]
pub struct FakeLauncher {
    pub fail_url: Option<String>,
    pub panic_url: Option<String>,
    pub render_delay: Duration,
    pub launched: Arc<AtomicUsize>,
    pub shut_down: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn failing_on(url: &str) -> Self {
        Self {
            fail_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn panicking_on(url: &str) -> Self {
        Self {
            panic_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn shut_down(&self) -> usize {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RendererLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageRenderer>, RenderFailure> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            fail_url: self.fail_url.clone(),
            panic_url: self.panic_url.clone(),
            delay: self.render_delay,
            shut_down: Arc::clone(&self.shut_down),
        }))
    }
}

struct FakeRenderer {
    fail_url: Option<String>,
    panic_url: Option<String>,
    delay: Duration,
    shut_down: Arc<AtomicUsize>,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&mut self, url: &str) -> Result<Vec<u8>, RenderFailure> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic_url.as_deref() == Some(url) {
            panic!("renderer crashed on {}", url);
        }
        if self.fail_url.as_deref() == Some(url) {
            return Err(RenderFailure::Navigation {
                url: url.to_string(),
                source: "net::ERR_CONNECTION_REFUSED".into(),
            });
        }
        Ok(single_page_pdf(url))
    }

    async fn shutdown(self: Box<Self>) -> Result<(), RenderFailure> {
        self.shut_down.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 输出和临时目录都指向 `root` 下的上下文
pub fn context(lookup: FakeLookup, launcher: Arc<FakeLauncher>, root: &Path) -> SessionContext {
    let config = Config {
        output_dir: root.join("out"),
        ..Config::default()
    };
    let mut ctx = SessionContext::new(Arc::new(lookup), launcher, &config);
    ctx.scratch_dir = root.join("scratch");
    std::fs::create_dir_all(&ctx.scratch_dir).unwrap();
    ctx
}

/// 单页 PDF，页面内容包含 `label`
pub fn single_page_pdf(label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(label.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// 按页码顺序取出每页内容流的文本
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).to_string())
        .collect()
}

/// 取完会话的全部事件
pub async fn drain(mut events: UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut all = Vec::new();
    while let Some(event) = events.recv().await {
        all.push(event);
    }
    all
}

pub fn terminal_events(events: &[SessionEvent]) -> Vec<&SessionEvent> {
    events.iter().filter(|e| e.is_terminal()).collect()
}
