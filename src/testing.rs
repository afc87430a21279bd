//! テスト用のインメモリページ
//!
//! セレクタ文字列をそのままキーにして要素を返すだけの簡易DOM。
//! 問い合わせたセレクタを記録するので、フォールバックの打ち切りも検証できる。
//! ログは `LogCapture` でバッファに取って検証する。

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::subscriber::DefaultGuard;
use tracing::Level;

use crate::error::ScraperError;
use crate::traits::{PageElement, PricingPage, Queryable};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    text: String,
    children: HashMap<String, Vec<FakeElement>>,
    failing: HashSet<String>,
    text_fails: bool,
    queried: Arc<Mutex<Vec<String>>>,
}

impl FakeElement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .extend(elements);
        self
    }

    pub fn failing_on(mut self, selector: &str) -> Self {
        self.failing.insert(selector.to_string());
        self
    }

    /// innerText の取得が失敗する要素
    pub fn broken_text(mut self) -> Self {
        self.text_fails = true;
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    fn lookup(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError> {
        self.queried.lock().unwrap().push(selector.to_string());
        if self.failing.contains(selector) {
            return Err(ScraperError::Query(format!("detached node: {}", selector)));
        }
        Ok(self
            .children
            .get(selector)
            .map(|elements| {
                elements
                    .iter()
                    .cloned()
                    .map(|e| Box::new(e) as Box<dyn PageElement>)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl Queryable for FakeElement {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError> {
        self.lookup(selector)
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> Result<String, ScraperError> {
        if self.text_fails {
            return Err(ScraperError::Query("node is detached from document".into()));
        }
        Ok(self.text.clone())
    }
}

/// URLごとに文書（ルート要素）を持つページ
#[derive(Debug, Default)]
pub struct FakePage {
    documents: HashMap<String, FakeElement>,
    unreachable: HashSet<String>,
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    query_instants: Mutex<Vec<Instant>>,
}

impl FakePage {
    /// `url` を表示中のページ
    pub fn new(url: &str) -> Self {
        let mut documents = HashMap::new();
        documents.insert(url.to_string(), FakeElement::default());
        Self {
            documents,
            current: Mutex::new(url.to_string()),
            ..Default::default()
        }
    }

    /// 遷移前の空ページ
    pub fn blank() -> Self {
        Self::new("about:blank")
    }

    fn current_document(&mut self) -> &mut FakeElement {
        let url = self.current.get_mut().unwrap().clone();
        self.documents.entry(url).or_default()
    }

    /// 表示中の文書に要素を追加
    pub fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        let doc = std::mem::take(self.current_document());
        *self.current_document() = doc.with(selector, elements);
        self
    }

    pub fn failing_on(mut self, selector: &str) -> Self {
        let doc = std::mem::take(self.current_document());
        *self.current_document() = doc.failing_on(selector);
        self
    }

    /// 遷移先URLの文書を登録
    pub fn route(mut self, url: &str, document: FakeElement) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }

    /// 遷移に失敗するURL
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn queried(&self) -> Vec<String> {
        let url = self.current.lock().unwrap().clone();
        self.documents
            .get(&url)
            .map(FakeElement::queried)
            .unwrap_or_default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// ページ全体への問い合わせ時刻（tokio の時計）
    pub fn query_instants(&self) -> Vec<Instant> {
        self.query_instants.lock().unwrap().clone()
    }
}

#[async_trait]
impl Queryable for FakePage {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError> {
        self.query_instants.lock().unwrap().push(Instant::now());
        let url = self.current.lock().unwrap().clone();
        match self.documents.get(&url) {
            Some(doc) => doc.lookup(selector),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl PricingPage for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), ScraperError> {
        self.navigations.lock().unwrap().push(url.to_string());
        if self.unreachable.contains(url) {
            return Err(ScraperError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)));
        }
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        *self.current.get_mut().unwrap() = "about:blank".to_string();
        Ok(())
    }
}

/// fmt サブスクライバの出力をメモリに溜める
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// このスレッドのデフォルトサブスクライバとして登録
    pub fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buf.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// 指定レベルのイベント数
    pub fn count(&self, level: Level) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.trim_start().starts_with(level.as_str()))
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
