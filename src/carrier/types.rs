//! キャリア料金関連の型定義

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::selector::SelectorChain;

/// 回線数スロットの数（1〜5回線）
pub const LINE_SLOTS: usize = 5;

/// プラン名が取れなかったときの名前
pub const UNKNOWN_PLAN: &str = "Unknown Plan";

/// プロバイダ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    /// 自社回線を持つキャリア
    #[serde(rename = "MNO")]
    Mno,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Mno => f.write_str("MNO"),
        }
    }
}

/// 表示価格に税・手数料が含まれるか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxesFeesIncluded {
    Yes,
    #[default]
    No,
}

impl fmt::Display for TaxesFeesIncluded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxesFeesIncluded::Yes => f.write_str("Yes"),
            TaxesFeesIncluded::No => f.write_str("No"),
        }
    }
}

/// プロバイダごとの固定設定
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: String,
    pub provider_type: ProviderType,
    /// 料金ページのURL
    pub url: String,
    /// プランカード（コンテナ）の候補。最初にヒットしたものを使う
    pub plan_container_selectors: SelectorChain,
    /// コンテナ内のプラン名の候補。最初にヒットしたものを使う
    pub plan_name_selectors: SelectorChain,
    /// コンテナ内の価格要素。すべて試して結果を連結する
    pub price_selectors: Vec<String>,
    /// 1回線あたりの自動支払い割引額
    pub autopay_discount: Option<f64>,
    pub taxes_fees_included: TaxesFeesIncluded,
}

/// プラン1件分のワイド形式レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidePricingRecord {
    pub provider_name: String,
    pub provider_type: ProviderType,
    pub plan_name: String,
    /// `prices[i]` は i+1 回線の価格（ページ上の出現順で詰めただけ）
    pub prices: [Option<f64>; LINE_SLOTS],
    pub autopay_discount: Option<f64>,
    pub taxes_fees_included: TaxesFeesIncluded,
    pub source_url: String,
}

impl WidePricingRecord {
    /// プロバイダ設定と見つかった価格リストからレコードを作る
    ///
    /// 価格はリストの先頭から順にスロットへ入れ、6件目以降は捨てる。
    pub fn from_prices(
        spec: &ProviderSpec,
        plan_name: impl Into<String>,
        prices: &[f64],
        source_url: impl Into<String>,
    ) -> Self {
        let mut slots = [None; LINE_SLOTS];
        for (slot, price) in slots.iter_mut().zip(prices) {
            *slot = Some(*price);
        }

        Self {
            provider_name: spec.name.clone(),
            provider_type: spec.provider_type,
            plan_name: plan_name.into(),
            prices: slots,
            autopay_discount: spec.autopay_discount,
            taxes_fees_included: spec.taxes_fees_included,
            source_url: source_url.into(),
        }
    }

    /// `line_count` 回線の価格（1始まり、範囲外は `None`）
    pub fn price_for(&self, line_count: usize) -> Option<f64> {
        line_count
            .checked_sub(1)
            .and_then(|i| self.prices.get(i).copied().flatten())
    }

    /// 価格が入っているスロット数
    pub fn populated_slots(&self) -> usize {
        self.prices.iter().filter(|p| p.is_some()).count()
    }
}

/// ロング形式の1行（プラン × 回線数）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub extraction_date: NaiveDate,
    pub extraction_timestamp: NaiveDateTime,
    pub provider_name: String,
    pub provider_type: ProviderType,
    pub plan_name: String,
    pub line_count: u8,
    pub monthly_price: f64,
    pub autopay_discount_amount: f64,
    pub has_autopay_discount: bool,
    pub taxes_fees_included: TaxesFeesIncluded,
    pub price_per_line: f64,
    pub source_url: String,
}
