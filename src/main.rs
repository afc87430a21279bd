//! 日次の料金取得
//!
//! 引数なし。設定は環境変数（`PRICING_OUTPUT_DIR` など）から読む。

use std::process::ExitCode;

use carrier_pricing::{PricingConfig, PricingService, RunRequest};
use tower::Service;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let request = RunRequest::new(PricingConfig::from_env());

    match PricingService::new().call(request).await {
        Ok(report) => {
            for (name, e) in &report.failures {
                info!("Skipped {}: {}", name, e);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Could not start browser: {}", e);
            ExitCode::FAILURE
        }
    }
}
