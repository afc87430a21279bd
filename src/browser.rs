//! Chromium (CDP) によるページ実装

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::error::ScraperError;
use crate::traits::{PageElement, PricingPage, Queryable};

/// ネットワークアイドル判定のインターバル（ミリ秒）
const NETWORK_IDLE_CHECK_INTERVAL_MS: u64 = 500;
/// 連続何回アイドルならOKとするか
const REQUIRED_IDLE_CHECKS: u32 = 3;

/// ブラウザイベントハンドラのタスク
///
/// `close()` を経ずにセッションが破棄された場合も、ここで止める。
struct HandlerTask(JoinHandle<()>);

impl HandlerTask {
    fn abort(&self) {
        self.0.abort();
    }
}

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// ブラウザプロセスと唯一のページ
pub struct ChromeSession {
    browser: Browser,
    handler: HandlerTask,
    page: ChromePage,
}

impl ChromeSession {
    /// ブラウザを起動してページを1枚開く
    pub async fn launch(config: &PricingConfig) -> Result<Self, ScraperError> {
        info!("Initializing browser...");

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(config.navigation_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", config.user_agent));

        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定エラー: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        info!("Browser initialized successfully");
        Ok(Self {
            browser,
            handler: HandlerTask(handler),
            page: ChromePage::new(page),
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// ページ・ブラウザ・ハンドラを順に閉じる
    ///
    /// 途中で失敗しても残りは閉じる。最初のエラーを返す。
    pub async fn close(mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");
        let mut first_error = None;

        if let Err(e) = self.page.close().await {
            warn!("Failed to close page: {}", e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
            first_error.get_or_insert(ScraperError::BrowserInit(e.to_string()));
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();

        info!("Browser closed");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// chromiumoxide のページ
pub struct ChromePage {
    page: Option<Page>,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page: Some(page) }
    }

    fn get_page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ページは既に閉じられています".into()))
    }

    /// 進行中のリソース取得がなくなるまで待機
    ///
    /// タイムアウトしても続行する（ログのみ）。
    async fn wait_network_idle(&self, page: &Page, timeout: Duration) {
        let start = std::time::Instant::now();
        let mut idle_count = 0;

        while start.elapsed() < timeout {
            let result = page
                .evaluate(
                    r#"
                    (() => {
                        const entries = performance.getEntriesByType('resource');
                        const now = performance.now();
                        const recent = entries.filter(e => (now - e.startTime) < 500 && e.duration === 0);
                        return recent.length === 0 && document.readyState === 'complete';
                    })()
                "#,
                )
                .await;

            match result {
                Ok(val) if val.clone().into_value::<bool>().unwrap_or(false) => {
                    idle_count += 1;
                    if idle_count >= REQUIRED_IDLE_CHECKS {
                        debug!("Network idle after {:?}", start.elapsed());
                        return;
                    }
                }
                Ok(_) => idle_count = 0,
                Err(e) => {
                    debug!("Network idle check error: {}", e);
                    idle_count = 0;
                }
            }

            sleep(Duration::from_millis(NETWORK_IDLE_CHECK_INTERVAL_MS)).await;
        }

        warn!("Network idle timeout after {:?}, proceeding anyway", start.elapsed());
    }
}

fn boxed(elements: Vec<Element>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|element| Box::new(ChromeElement { element }) as Box<dyn PageElement>)
        .collect()
}

#[async_trait]
impl Queryable for ChromePage {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError> {
        let elements = self
            .get_page()?
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::Query(format!("{}: {}", selector, e)))?;
        Ok(boxed(elements))
    }
}

#[async_trait]
impl PricingPage for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        let page = self.get_page()?;
        let start = std::time::Instant::now();

        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| ScraperError::Timeout(format!("{} ({:?})", url, timeout)))?
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        let remaining = timeout.saturating_sub(start.elapsed());
        self.wait_network_idle(page, remaining).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        let url = self
            .get_page()?
            .url()
            .await
            .map_err(|e| ScraperError::Query(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(page) = self.page.take() {
            page.close()
                .await
                .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;
        }
        Ok(())
    }
}

/// chromiumoxide の要素
pub struct ChromeElement {
    element: Element,
}

#[async_trait]
impl Queryable for ChromeElement {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::Query(format!("{}: {}", selector, e)))?;
        Ok(boxed(elements))
    }
}

#[async_trait]
impl PageElement for ChromeElement {
    async fn text(&self) -> Result<String, ScraperError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| ScraperError::Query(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_handler_task_aborts_on_drop() {
        let (tx, rx) = oneshot::channel::<()>();
        let task = HandlerTask(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        }));

        drop(task);

        // 中断されたタスクが送信側を破棄する
        assert!(rx.await.is_err());
    }
}
