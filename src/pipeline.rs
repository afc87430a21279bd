//! 巡回 → 正規化 → 出力 の一連の処理

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::carrier::{normalize_at, NormalizedRow, ProviderSpec, WidePricingRecord};
use crate::config::PricingConfig;
use crate::error::ScraperError;
use crate::orchestrator::{ProviderOrchestrator, ProviderOutcome};
use crate::sink::{output_file_names, save_snapshot};
use crate::traits::{PricingPage, ResultSink};

/// 1回の実行結果
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<WidePricingRecord>,
    pub rows: Vec<NormalizedRow>,
    /// 書き出せたファイル
    pub outputs: Vec<PathBuf>,
    /// 失敗したプロバイダ・出力（名前, エラー）
    pub failures: Vec<(String, ScraperError)>,
}

impl RunReport {
    /// 出力がなかった（全プロバイダで0件）
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct PricingPipeline {
    orchestrator: ProviderOrchestrator,
    sink: Box<dyn ResultSink>,
    snapshot_dir: Option<PathBuf>,
}

impl PricingPipeline {
    pub fn new(providers: Vec<ProviderSpec>, config: PricingConfig, sink: Box<dyn ResultSink>) -> Self {
        Self {
            snapshot_dir: config.snapshot_dir.clone(),
            orchestrator: ProviderOrchestrator::new(providers, config),
            sink,
        }
    }

    pub async fn run(&self, page: &dyn PricingPage) -> RunReport {
        self.run_at(page, Local::now().naive_local()).await
    }

    /// `captured_at` を抽出時刻として実行
    ///
    /// エラーは返さない。プロバイダや出力の失敗は `RunReport::failures` に残る。
    pub async fn run_at(&self, page: &dyn PricingPage, captured_at: NaiveDateTime) -> RunReport {
        info!("Starting mobile provider scraping...");
        let mut report = RunReport::default();

        for outcome in self.orchestrator.run_outcomes(page).await {
            match outcome {
                ProviderOutcome::Extracted { records, .. } => report.records.extend(records),
                ProviderOutcome::Failed { provider, error } => report.failures.push((provider, error)),
            }
        }

        if report.records.is_empty() {
            warn!("No data scraped from any provider");
            return report;
        }

        if let Some(dir) = &self.snapshot_dir {
            if let Err(e) = save_snapshot(dir, &report.records, captured_at).await {
                warn!("Failed to save wide records snapshot: {}", e);
            }
        }

        report.rows = normalize_at(&report.records, captured_at);

        let (primary, archive) = output_file_names(captured_at.date());
        for file_name in [primary, archive] {
            match self.sink.write(&report.rows, &file_name).await {
                Ok(path) => report.outputs.push(path),
                Err(e) => {
                    error!("Failed to write {}: {}", file_name, e);
                    report.failures.push((file_name, e));
                }
            }
        }

        info!(
            "Run finished: {} plans, {} rows, {} files",
            report.records.len(),
            report.rows.len(),
            report.outputs.len()
        );
        report
    }
}
