//! 組み込みのプロバイダ一覧
//!
//! ページ構成が変わったらここのセレクタを更新する。

use crate::selector::SelectorChain;

use super::types::{ProviderSpec, ProviderType, TaxesFeesIncluded};

pub const VERIZON_URL: &str = "https://www.verizon.com/plans/unlimited/";
pub const T_MOBILE_URL: &str = "https://www.t-mobile.com/cell-phone-plans";

pub fn verizon() -> ProviderSpec {
    ProviderSpec {
        name: "Verizon".to_string(),
        provider_type: ProviderType::Mno,
        url: VERIZON_URL.to_string(),
        plan_container_selectors: SelectorChain::new([
            r#"[data-testid*="plan"]"#,
            ".plan-card",
            ".unlimited-plan",
            ".plan-container",
            ".plan-tile",
        ]),
        plan_name_selectors: SelectorChain::new([
            "h2",
            "h3",
            ".plan-name",
            ".plan-title",
            r#"[data-testid*="title"]"#,
        ]),
        price_selectors: strings([
            ".price",
            r#"[data-testid*="price"]"#,
            ".cost",
            ".monthly-price",
        ]),
        autopay_discount: Some(10.0),
        taxes_fees_included: TaxesFeesIncluded::No,
    }
}

pub fn t_mobile() -> ProviderSpec {
    ProviderSpec {
        name: "T-Mobile".to_string(),
        provider_type: ProviderType::Mno,
        url: T_MOBILE_URL.to_string(),
        plan_container_selectors: SelectorChain::new([
            ".plan-tile",
            r#"[data-testid*="plan"]"#,
            ".plan-card",
            ".plan-container",
        ]),
        plan_name_selectors: SelectorChain::new(["h2", "h3", ".plan-title", ".plan-name"]),
        price_selectors: strings([".price", ".cost", r#"[data-testid*="price"]"#]),
        autopay_discount: Some(5.0),
        taxes_fees_included: TaxesFeesIncluded::Yes,
    }
}

/// 実行順のプロバイダ一覧
pub fn default_providers() -> Vec<ProviderSpec> {
    vec![verizon(), t_mobile()]
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
