//! ワイド形式 → ロング形式への変換

use chrono::{Local, NaiveDateTime};

use super::types::{NormalizedRow, WidePricingRecord, LINE_SLOTS};

/// 現在時刻を抽出時刻として変換
pub fn normalize(records: &[WidePricingRecord]) -> Vec<NormalizedRow> {
    normalize_at(records, Local::now().naive_local())
}

/// 価格の入っているスロットごとに1行を出す
///
/// 抽出日時は呼び出し1回につき1つで、全行が同じ値を持つ。
/// 行の順序はレコード順・回線数の昇順。
pub fn normalize_at(records: &[WidePricingRecord], captured_at: NaiveDateTime) -> Vec<NormalizedRow> {
    let extraction_date = captured_at.date();
    let mut rows = Vec::new();

    for record in records {
        for line_count in 1..=LINE_SLOTS {
            let Some(monthly_price) = record.price_for(line_count) else {
                continue;
            };

            rows.push(NormalizedRow {
                extraction_date,
                extraction_timestamp: captured_at,
                provider_name: record.provider_name.clone(),
                provider_type: record.provider_type,
                plan_name: record.plan_name.clone(),
                line_count: line_count as u8,
                monthly_price,
                autopay_discount_amount: record.autopay_discount.unwrap_or(0.0),
                has_autopay_discount: record.autopay_discount.is_some_and(|d| d != 0.0),
                taxes_fees_included: record.taxes_fees_included,
                price_per_line: monthly_price / line_count as f64,
                source_url: record.source_url.clone(),
            });
        }
    }

    rows
}
