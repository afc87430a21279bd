use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::carrier::NormalizedRow;
use crate::error::ScraperError;

/// CSSセレクタで子孫要素を問い合わせできるもの（ページ・要素の共通部分）
#[async_trait]
pub trait Queryable: Send + Sync {
    /// セレクタに一致する子孫要素をすべて返す（一致なしは空Vec）
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>, ScraperError>;
}

/// DOM要素
#[async_trait]
pub trait PageElement: Queryable {
    /// 表示テキスト（innerText）
    async fn text(&self) -> Result<String, ScraperError>;
}

/// ブラウザページ
#[async_trait]
pub trait PricingPage: Queryable {
    /// URLへ遷移し、ネットワークがアイドルになるまで待機
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// 現在のURL
    async fn current_url(&self) -> Result<String, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// 正規化済みテーブルの出力先
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// テーブルを書き出し、保存先を返す
    async fn write(&self, rows: &[NormalizedRow], file_name: &str) -> Result<PathBuf, ScraperError>;
}
