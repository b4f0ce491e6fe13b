/// 模块列表查询客户端
///
/// 封装所有与查询 API 相关的调用逻辑
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::LookupError;
use crate::models::PageTask;

/// 查询能力：根据目标 URL 返回"模块 -> 页面列表"的 JSON
#[async_trait]
pub trait PageLookup: Send + Sync {
    async fn lookup(&self, target_url: &str) -> Result<Value, LookupError>;
}

/// 基于 HTTP 的查询客户端
pub struct HttpLookup {
    client: Client,
    api_url: String,
    timeout: Duration,
}

impl HttpLookup {
    /// 创建新的查询客户端
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(config.lookup_timeout())
            .build()
            .map_err(|e| LookupError::RequestFailed {
                endpoint: config.lookup_api_url.clone(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            api_url: config.lookup_api_url.clone(),
            timeout: config.lookup_timeout(),
        })
    }
}

#[async_trait]
impl PageLookup for HttpLookup {
    async fn lookup(&self, target_url: &str) -> Result<Value, LookupError> {
        debug!("查询 API: {} (url={})", self.api_url, target_url);

        let request = async {
            let response = self
                .client
                .get(&self.api_url)
                .query(&[("url", target_url)])
                .send()
                .await
                .map_err(|e| self.request_error(e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LookupError::BadStatus {
                    endpoint: self.api_url.clone(),
                    status: status.as_u16(),
                });
            }

            let body = response.text().await.map_err(|e| self.request_error(e))?;

            serde_json::from_str::<Value>(&body).map_err(|e| LookupError::Unparseable {
                reason: e.to_string(),
            })
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| self.timed_out())?
    }
}

impl HttpLookup {
    fn timed_out(&self) -> LookupError {
        LookupError::Timeout {
            endpoint: self.api_url.clone(),
            secs: self.timeout.as_secs(),
        }
    }

    /// reqwest 自身的超时和外层超时归为同一种错误
    fn request_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            return self.timed_out();
        }
        LookupError::RequestFailed {
            endpoint: self.api_url.clone(),
            source: Box::new(e),
        }
    }
}

/// 把查询结果展开为有序的页面列表
///
/// 输入形如 `{"模块A": [{"url": ...}, ...], "模块B": [...]}`，
/// 先按模块顺序、再按模块内顺序编号
pub fn parse_page_tasks(response: &Value) -> Result<Vec<PageTask>, LookupError> {
    let modules = response.as_object().ok_or_else(|| LookupError::Unparseable {
        reason: "返回值不是 JSON 对象".to_string(),
    })?;

    let mut tasks = Vec::new();
    for (module_key, items) in modules {
        let items = items.as_array().ok_or_else(|| LookupError::Unparseable {
            reason: format!("模块 {} 的值不是数组", module_key),
        })?;

        for (position, item) in items.iter().enumerate() {
            let url = item
                .get("url")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .ok_or_else(|| LookupError::Unparseable {
                    reason: format!("模块 {} 的第 {} 项缺少 url", module_key, position + 1),
                })?;

            tasks.push(PageTask {
                module_key: module_key.clone(),
                sequence_index: tasks.len(),
                source_url: url.to_string(),
            });
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flattens_modules_in_order() {
        let response: Value = serde_json::from_str(
            r#"{"Module B": [{"url": "http://x/1"}],
                "Module A": [{"url": "http://x/2", "title": "t"}, {"url": "http://x/3"}]}"#,
        )
        .unwrap();

        let tasks = parse_page_tasks(&response).unwrap();
        let urls: Vec<_> = tasks.iter().map(|t| t.source_url.as_str()).collect();
        assert_eq!(urls, vec!["http://x/1", "http://x/2", "http://x/3"]);
        assert_eq!(tasks[0].module_key, "Module B");
        assert_eq!(tasks[2].module_key, "Module A");
        assert_eq!(
            tasks.iter().map(|t| t.sequence_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(parse_page_tasks(&json!({})).unwrap().is_empty());
        assert!(parse_page_tasks(&json!({"Module A": []})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_response() {
        assert!(parse_page_tasks(&json!([1, 2])).is_err());
        assert!(parse_page_tasks(&json!({"Module A": "nope"})).is_err());
        assert!(parse_page_tasks(&json!({"Module A": [{"title": "no url"}]})).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_times_out_when_api_never_answers() {
        // 只 bind 不 accept：连接能建立，但永远没有响应
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Config {
            lookup_api_url: format!("http://{}/api", listener.local_addr().unwrap()),
            lookup_timeout_secs: 5,
            ..Config::default()
        };
        let lookup = HttpLookup::new(&config).unwrap();

        let err = lookup.lookup("http://course.test/").await.unwrap_err();

        match err {
            LookupError::Timeout { secs, .. } => assert_eq!(secs, 5),
            other => panic!("unexpected error: {other}"),
        }
        drop(listener);
    }

    /// 测试真实 API 连接性
    #[tokio::test]
    #[ignore]
    async fn test_http_lookup_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let lookup = HttpLookup::new(&Config::from_env()).unwrap();
        let result = lookup
            .lookup("https://learn.microsoft.com/en-us/training/courses/az-900t00")
            .await;

        match result {
            Ok(value) => {
                let tasks = parse_page_tasks(&value).unwrap();
                println!("找到 {} 个页面", tasks.len());
            }
            Err(e) => panic!("查询失败: {}", e),
        }
    }
}
