//! セレクタのフォールバック解決
//!
//! ページのマークアップは頻繁に変わるので、候補セレクタを優先順に並べ、
//! 最初に1件以上ヒットしたものの結果を採用する。

use tracing::debug;

use crate::error::ScraperError;
use crate::traits::{PageElement, Queryable};

/// 優先順位付きのセレクタ候補
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorChain {
    selectors: Vec<String>,
}

/// 最初にヒットしたセレクタとその結果
pub struct SelectorMatch {
    pub selector: String,
    pub elements: Vec<Box<dyn PageElement>>,
}

impl SelectorChain {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// 先頭から順に試し、最初に1件以上ヒットしたセレクタの結果を返す
    ///
    /// ヒットした時点で打ち切る。どれもヒットしなければ `Ok(None)`。
    pub async fn first_match<Q>(&self, container: &Q) -> Result<Option<SelectorMatch>, ScraperError>
    where
        Q: Queryable + ?Sized,
    {
        for selector in &self.selectors {
            let elements = container.query_all(selector).await?;
            if !elements.is_empty() {
                debug!("Selector '{}' matched {} elements", selector, elements.len());
                return Ok(Some(SelectorMatch {
                    selector: selector.clone(),
                    elements,
                }));
            }
        }
        Ok(None)
    }

    /// `first_match` の要素だけを返す版（一致なしは空Vec）
    pub async fn resolve<Q>(&self, container: &Q) -> Result<Vec<Box<dyn PageElement>>, ScraperError>
    where
        Q: Queryable + ?Sized,
    {
        Ok(self
            .first_match(container)
            .await?
            .map(|m| m.elements)
            .unwrap_or_default())
    }
}
