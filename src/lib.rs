//! 携帯キャリア料金スクレイパー
//!
//! - プロバイダの料金ページからプランと価格を抽出（セレクタのフォールバック付き）
//! - 回線数ごとのロング形式に正規化してCSVに出力
//!
//! # 使用例
//!
//! ```rust,ignore
//! use carrier_pricing::{PricingConfig, PricingService, RunRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = PricingService::new();
//!
//!     let request = RunRequest::new(PricingConfig::from_env().with_output_dir("./output"));
//!
//!     let report = service.call(request).await.unwrap();
//!     println!("rows: {}, files: {:?}", report.rows.len(), report.outputs);
//! }
//! ```
//!
//! # ページを差し替えて使う
//!
//! ```rust,ignore
//! use carrier_pricing::{catalog, normalize, ProviderOrchestrator, PricingConfig};
//!
//! let orchestrator = ProviderOrchestrator::new(catalog::default_providers(), PricingConfig::default());
//! let records = orchestrator.run(&my_page).await;
//! let rows = normalize(&records);
//! ```

pub mod browser;
pub mod carrier;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod price;
pub mod selector;
pub mod service;
pub mod sink;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型をリエクスポート
pub use browser::{ChromePage, ChromeSession};
pub use carrier::{
    catalog, normalize, normalize_at, NormalizedRow, PlanExtractor, ProviderSpec, ProviderType,
    TaxesFeesIncluded, WidePricingRecord,
};
pub use config::PricingConfig;
pub use error::ScraperError;
pub use orchestrator::{ProviderOrchestrator, ProviderOutcome};
pub use pipeline::{PricingPipeline, RunReport};
pub use price::parse_price;
pub use selector::SelectorChain;
pub use service::{PricingService, RunRequest};
pub use sink::CsvSink;
pub use traits::{PageElement, PricingPage, Queryable, ResultSink};
