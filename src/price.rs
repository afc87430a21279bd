//! 価格テキストのパース
//!
//! `$` の直後の数字（小数部はちょうど2桁のみ）を最初の1件だけ拾う。
//! 他の通貨記号やロケール表記は扱わない。

use std::sync::LazyLock;

use regex::Regex;

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\d+(?:\.\d{2})?)").expect("PRICE_PATTERN regex")
});

/// テキストから最初の価格を取り出す
///
/// 空文字・`None`・パターン不一致はいずれも `None`。
pub fn parse_price(text: Option<&str>) -> Option<f64> {
    let text = text.filter(|t| !t.is_empty())?;
    let captures = PRICE_PATTERN.captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}
