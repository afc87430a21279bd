//! 正規化テーブルの出力
//!
//! - CSV（ヘッダ付き、カンマ区切り）
//! - ワイド形式レコードのJSONスナップショット（任意）

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::carrier::{NormalizedRow, WidePricingRecord};
use crate::error::ScraperError;
use crate::traits::ResultSink;

const REPORT_TITLE: &str = "Daily Mobile Provider Pricing";

pub const CSV_HEADER: [&str; 12] = [
    "extraction_date",
    "extraction_timestamp",
    "provider_name",
    "provider_type",
    "plan_name",
    "line_count",
    "monthly_price",
    "autopay_discount_amount",
    "has_autopay_discount",
    "taxes_fees_included",
    "price_per_line",
    "source_url",
];

/// 本ファイル名とアーカイブファイル名
pub fn output_file_names(date: NaiveDate) -> (String, String) {
    let prefix = date.format("%Y%m%d");
    (
        format!("{} - {}.csv", prefix, REPORT_TITLE),
        format!("{} - {} - Archive.csv", prefix, REPORT_TITLE),
    )
}

/// 出力ディレクトリにCSVを書き出す
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    async fn write(&self, rows: &[NormalizedRow], file_name: &str) -> Result<PathBuf, ScraperError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ScraperError::Output(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(file_name);

        let mut buf = Vec::new();
        write_csv(&mut buf, rows)?;
        tokio::fs::write(&path, buf)
            .await
            .map_err(|e| ScraperError::Output(format!("{}: {}", path.display(), e)))?;

        info!("Saved {} records to {:?}", rows.len(), path);
        Ok(path)
    }
}

/// ヘッダ行 + 1行ずつ書き出す
pub fn write_csv<W: Write>(mut w: W, rows: &[NormalizedRow]) -> io::Result<()> {
    write_record(&mut w, CSV_HEADER.iter().copied())?;
    for row in rows {
        let fields = csv_fields(row);
        write_record(&mut w, fields.iter().map(String::as_str))?;
    }
    Ok(())
}

fn csv_fields(row: &NormalizedRow) -> [String; 12] {
    [
        row.extraction_date.format("%Y-%m-%d").to_string(),
        format_timestamp(row.extraction_timestamp),
        row.provider_name.clone(),
        row.provider_type.to_string(),
        row.plan_name.clone(),
        row.line_count.to_string(),
        format_number(row.monthly_price),
        format_number(row.autopay_discount_amount),
        if row.has_autopay_discount { "True" } else { "False" }.to_string(),
        row.taxes_fees_included.to_string(),
        format_number(row.price_per_line),
        row.source_url.clone(),
    ]
}

fn write_record<'a, W: Write>(w: &mut W, fields: impl Iterator<Item = &'a str>) -> io::Result<()> {
    let mut first = true;
    for field in fields {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        if needs_quotes(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// ISO 8601（マイクロ秒まで）
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// 整数値でも小数点を残す（50 → "50.0"）
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// ワイド形式レコードをJSONで保存
///
/// 失敗しても実行は止めない（呼び出し側でログのみ）。
pub async fn save_snapshot(
    dir: &Path,
    records: &[WidePricingRecord],
    captured_at: NaiveDateTime,
) -> Result<PathBuf, ScraperError> {
    let path = dir.join(format!("wide_records_{}.json", captured_at.format("%Y%m%d_%H%M%S")));

    tokio::fs::create_dir_all(dir).await?;
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(&path, json).await?;

    info!("Saved wide records snapshot to {:?}", path);
    Ok(path)
}
