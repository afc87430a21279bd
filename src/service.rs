use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::browser::ChromeSession;
use crate::carrier::{catalog, ProviderSpec};
use crate::config::PricingConfig;
use crate::error::ScraperError;
use crate::pipeline::{PricingPipeline, RunReport};
use crate::sink::CsvSink;

/// 実行リクエスト
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub config: PricingConfig,
    pub providers: Vec<ProviderSpec>,
}

impl RunRequest {
    /// 組み込みのプロバイダ一覧で実行
    pub fn new(config: PricingConfig) -> Self {
        Self {
            config,
            providers: catalog::default_providers(),
        }
    }

    pub fn with_providers(mut self, providers: Vec<ProviderSpec>) -> Self {
        self.providers = providers;
        self
    }
}

impl Default for RunRequest {
    fn default() -> Self {
        Self::new(PricingConfig::from_env())
    }
}

/// tower::Serviceを実装した料金スクレイパーサービス
///
/// ブラウザ起動に失敗した場合のみ `Err`。起動後は必ずブラウザを閉じる。
#[derive(Debug, Clone, Default)]
pub struct PricingService {}

impl PricingService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<RunRequest> for PricingService {
    type Response = RunReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RunRequest) -> Self::Future {
        info!(
            "Run request received: {} providers, output={:?}",
            req.providers.len(),
            req.config.output_dir
        );

        Box::pin(async move {
            let sink = CsvSink::new(&req.config.output_dir);
            let session = ChromeSession::launch(&req.config).await?;
            let pipeline = PricingPipeline::new(req.providers, req.config, Box::new(sink));

            let report = pipeline.run(session.page()).await;

            if let Err(e) = session.close().await {
                warn!("Browser did not close cleanly: {}", e);
            }

            Ok(report)
        })
    }
}
