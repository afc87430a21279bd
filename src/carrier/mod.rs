//! キャリア料金の抽出・正規化モジュール
//!
//! プロバイダの料金ページからプランをワイド形式で抜き出し、
//! 回線数ごとのロング形式に展開する

pub mod catalog;
mod extractor;
mod normalize;
mod types;

pub use extractor::PlanExtractor;
pub use normalize::{normalize, normalize_at};
pub use types::{
    NormalizedRow, ProviderSpec, ProviderType, TaxesFeesIncluded, WidePricingRecord, LINE_SLOTS,
    UNKNOWN_PLAN,
};
