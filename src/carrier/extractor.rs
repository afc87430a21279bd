//! プロバイダ1社分のプラン抽出

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::error::ScraperError;
use crate::price::parse_price;
use crate::traits::{PageElement, PricingPage};

use super::types::{ProviderSpec, WidePricingRecord, UNKNOWN_PLAN};

/// 料金ページからプランを抜き出す
#[derive(Debug, Clone)]
pub struct PlanExtractor {
    navigation_timeout: Duration,
    settle_delay: Duration,
    max_plans: usize,
}

impl PlanExtractor {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout,
            settle_delay: config.settle_delay,
            max_plans: config.max_plans_per_provider,
        }
    }

    /// ページを開いてプランを抽出
    ///
    /// コンテナが見つからない場合は空Vec。ナビゲーションやページ全体の
    /// 問い合わせに失敗した場合は `Err` を返し、呼び出し側で処理する。
    /// 個々のコンテナの失敗はここでログに残してスキップする。
    pub async fn extract(
        &self,
        page: &dyn PricingPage,
        spec: &ProviderSpec,
    ) -> Result<Vec<WidePricingRecord>, ScraperError> {
        info!("Navigating to {}", spec.url);
        page.goto(&spec.url, self.navigation_timeout).await?;

        // クライアント描画が終わるまでの固定待機
        sleep(self.settle_delay).await;

        let Some(found) = spec.plan_container_selectors.first_match(page).await? else {
            warn!("No plan elements found on {} page", spec.name);
            return Ok(Vec::new());
        };
        info!(
            "Found {} {} plans using selector: {}",
            found.elements.len(),
            spec.name,
            found.selector
        );

        let source_url = page.current_url().await?;
        let mut records = Vec::new();

        for (i, container) in found.elements.iter().take(self.max_plans).enumerate() {
            match self.extract_plan(&**container, spec, &source_url).await {
                Ok(record) => {
                    info!(
                        "Extracted {} plan: {} ({} prices)",
                        spec.name,
                        record.plan_name,
                        record.populated_slots()
                    );
                    records.push(record);
                }
                Err(e) => {
                    warn!("Error extracting {} plan {}: {}", spec.name, i, e);
                }
            }
        }

        Ok(records)
    }

    /// コンテナ1件からレコードを組み立てる
    async fn extract_plan(
        &self,
        container: &dyn PageElement,
        spec: &ProviderSpec,
        source_url: &str,
    ) -> Result<WidePricingRecord, ScraperError> {
        let plan_name = self.plan_name(container, spec).await?;
        let prices = self.collect_prices(container, spec).await?;
        debug!("Plan '{}' prices: {:?}", plan_name, prices);

        Ok(WidePricingRecord::from_prices(
            spec,
            plan_name,
            &prices,
            source_url,
        ))
    }

    async fn plan_name(
        &self,
        container: &dyn PageElement,
        spec: &ProviderSpec,
    ) -> Result<String, ScraperError> {
        let elements = spec.plan_name_selectors.resolve(container).await?;
        match elements.first() {
            Some(element) => Ok(element.text().await?.trim().to_string()),
            None => Ok(UNKNOWN_PLAN.to_string()),
        }
    }

    /// 全価格セレクタの一致要素を出現順に集める（打ち切りなし）
    async fn collect_prices(
        &self,
        container: &dyn PageElement,
        spec: &ProviderSpec,
    ) -> Result<Vec<f64>, ScraperError> {
        let mut prices = Vec::new();
        for selector in &spec.price_selectors {
            for element in container.query_all(selector).await? {
                let text = element.text().await?;
                if let Some(price) = parse_price(Some(&text)) {
                    prices.push(price);
                }
            }
        }
        Ok(prices)
    }
}
