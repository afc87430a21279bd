//! プロバイダを順番に巡回する

use tokio::time::sleep;
use tracing::{debug, error, info, info_span, Instrument};

use crate::carrier::{PlanExtractor, ProviderSpec, WidePricingRecord};
use crate::config::PricingConfig;
use crate::error::ScraperError;
use crate::traits::PricingPage;

/// プロバイダ1社分の結果
#[derive(Debug)]
pub enum ProviderOutcome {
    Extracted {
        provider: String,
        records: Vec<WidePricingRecord>,
    },
    Failed {
        provider: String,
        error: ScraperError,
    },
}

impl ProviderOutcome {
    pub fn provider(&self) -> &str {
        match self {
            ProviderOutcome::Extracted { provider, .. } | ProviderOutcome::Failed { provider, .. } => {
                provider.as_str()
            }
        }
    }

    /// 失敗したプロバイダは0件扱い
    pub fn records(&self) -> &[WidePricingRecord] {
        match self {
            ProviderOutcome::Extracted { records, .. } => records.as_slice(),
            ProviderOutcome::Failed { .. } => &[],
        }
    }

    pub fn into_records(self) -> Vec<WidePricingRecord> {
        match self {
            ProviderOutcome::Extracted { records, .. } => records,
            ProviderOutcome::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProviderOutcome::Failed { .. })
    }
}

/// 固定のプロバイダ一覧を1ページで順に処理する
pub struct ProviderOrchestrator {
    providers: Vec<ProviderSpec>,
    extractor: PlanExtractor,
    config: PricingConfig,
}

impl ProviderOrchestrator {
    pub fn new(providers: Vec<ProviderSpec>, config: PricingConfig) -> Self {
        Self {
            providers,
            extractor: PlanExtractor::new(&config),
            config,
        }
    }

    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    /// 全プロバイダのレコードをプロバイダ順に連結して返す
    pub async fn run(&self, page: &dyn PricingPage) -> Vec<WidePricingRecord> {
        self.run_outcomes(page)
            .await
            .into_iter()
            .flat_map(ProviderOutcome::into_records)
            .collect()
    }

    /// プロバイダごとの結果を返す
    ///
    /// 失敗しても次のプロバイダへ進む。各プロバイダの後（失敗時も）に
    /// ランダムな待機を入れる。
    pub async fn run_outcomes(&self, page: &dyn PricingPage) -> Vec<ProviderOutcome> {
        let mut outcomes = Vec::with_capacity(self.providers.len());

        for spec in &self.providers {
            let span = info_span!("provider", name = %spec.name);
            let outcome = self.visit(page, spec).instrument(span).await;
            outcomes.push(outcome);

            let delay = self.config.pick_politeness_delay();
            debug!("Sleeping {:?} before next provider", delay);
            sleep(delay).await;
        }

        outcomes
    }

    async fn visit(&self, page: &dyn PricingPage, spec: &ProviderSpec) -> ProviderOutcome {
        info!("Starting {} scrape...", spec.name);
        match self.extractor.extract(page, spec).await {
            Ok(records) => {
                info!("Completed {}: {} plans extracted", spec.name, records.len());
                ProviderOutcome::Extracted {
                    provider: spec.name.clone(),
                    records,
                }
            }
            Err(e) => {
                error!("Failed to scrape {}: {}", spec.name, e);
                ProviderOutcome::Failed {
                    provider: spec.name.clone(),
                    error: e,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::Instant;
    use tracing::Level;

    use crate::carrier::catalog;
    use crate::testing::{FakeElement, FakePage, LogCapture};

    fn orchestrator() -> ProviderOrchestrator {
        ProviderOrchestrator::new(
            catalog::default_providers(),
            PricingConfig::default().without_delays(),
        )
    }

    fn tile(name: &str, price: &str) -> FakeElement {
        FakeElement::new(name)
            .with("h2", vec![FakeElement::new(name)])
            .with(".price", vec![FakeElement::new(price)])
    }

    #[tokio::test]
    async fn test_failed_provider_is_skipped() {
        let document = FakeElement::default().with(
            ".plan-tile",
            vec![tile("Essentials", "$60/mo"), tile("Go5G", "$75/mo")],
        );
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .route(catalog::T_MOBILE_URL, document);

        let outcomes = orchestrator().run_outcomes(&page).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[0].provider(), "Verizon");
        assert!(outcomes[0].records().is_empty());
        assert!(!outcomes[1].is_failed());
        assert_eq!(outcomes[1].records().len(), 2);
        assert_eq!(
            page.navigations(),
            vec![catalog::VERIZON_URL, catalog::T_MOBILE_URL]
        );
    }

    #[tokio::test]
    async fn test_run_returns_only_successful_records() {
        let document = FakeElement::default().with(
            ".plan-tile",
            vec![tile("Essentials", "$60/mo"), tile("Go5G", "$75/mo")],
        );
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .route(catalog::T_MOBILE_URL, document);

        let records = orchestrator().run(&page).await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.provider_name == "T-Mobile"));
        assert!(records.iter().all(|r| r.populated_slots() == 1));
    }

    #[tokio::test]
    async fn test_records_in_provider_order() {
        let verizon = FakeElement::default().with(".plan-card", vec![tile("Unlimited Welcome", "$65")]);
        let t_mobile = FakeElement::default().with(".plan-tile", vec![tile("Essentials", "$60")]);
        let page = FakePage::blank()
            .route(catalog::T_MOBILE_URL, t_mobile)
            .route(catalog::VERIZON_URL, verizon);

        let records = orchestrator().run(&page).await;

        let providers: Vec<_> = records.iter().map(|r| r.provider_name.as_str()).collect();
        assert_eq!(providers, vec!["Verizon", "T-Mobile"]);
    }

    #[tokio::test]
    async fn test_provider_without_containers_continues() {
        let t_mobile = FakeElement::default().with(".plan-tile", vec![tile("Essentials", "$60")]);
        let page = FakePage::blank()
            .route(catalog::VERIZON_URL, FakeElement::default())
            .route(catalog::T_MOBILE_URL, t_mobile);

        let outcomes = orchestrator().run_outcomes(&page).await;

        assert!(!outcomes[0].is_failed());
        assert!(outcomes[0].records().is_empty());
        assert_eq!(outcomes[1].records().len(), 1);
    }

    #[tokio::test]
    async fn test_every_provider_failing_is_not_fatal() {
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .unreachable(catalog::T_MOBILE_URL);

        let outcomes = orchestrator().run_outcomes(&page).await;

        assert!(outcomes.iter().all(ProviderOutcome::is_failed));
    }

    #[tokio::test]
    async fn test_failed_provider_logs_one_error() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let document = FakeElement::default().with(".plan-tile", vec![tile("Essentials", "$60/mo")]);
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .route(catalog::T_MOBILE_URL, document);

        orchestrator().run_outcomes(&page).await;

        assert_eq!(logs.count(Level::ERROR), 1, "{:#?}", logs.lines());
        assert!(logs.lines().iter().any(|line| line.contains("Failed to scrape Verizon")));
        assert_eq!(logs.count(Level::WARN), 0);
    }

    fn timed_orchestrator() -> ProviderOrchestrator {
        let config = PricingConfig::default()
            .with_settle_delay(Duration::from_secs(5))
            .with_politeness_delay(Duration::from_secs(4)..=Duration::from_secs(4));
        ProviderOrchestrator::new(catalog::default_providers(), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_politeness_delay_follows_every_provider() {
        let document = FakeElement::default().with(".plan-tile", vec![tile("Essentials", "$60/mo")]);
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .route(catalog::T_MOBILE_URL, document);
        let start = Instant::now();

        let outcomes = timed_orchestrator().run_outcomes(&page).await;

        // T-Mobile の描画待ち5秒 + 4秒 × 2社
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(13) && elapsed < Duration::from_secs(14),
            "{:?}",
            elapsed
        );
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[1].records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_politeness_delay_after_failed_provider() {
        let page = FakePage::blank()
            .unreachable(catalog::VERIZON_URL)
            .unreachable(catalog::T_MOBILE_URL);
        let start = Instant::now();

        timed_orchestrator().run_outcomes(&page).await;

        // 遷移に失敗したので描画待ちはなし
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9),
            "{:?}",
            elapsed
        );
    }
}
