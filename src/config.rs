use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// デスクトップChromeのユーザーエージェント
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 実行設定
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// ヘッドレスモード
    pub headless: bool,
    /// Chrome実行ファイル（未指定ならchromiumoxideの自動検出）
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    /// ナビゲーション（ネットワークアイドル待機を含む）の上限
    pub navigation_timeout: Duration,
    /// ナビゲーション後の固定待機
    pub settle_delay: Duration,
    /// プロバイダ間のランダム待機の範囲
    pub politeness_delay: RangeInclusive<Duration>,
    /// 1プロバイダあたりに処理するプランコンテナの上限
    pub max_plans_per_provider: usize,
    /// CSV出力先
    pub output_dir: PathBuf,
    /// ワイド形式レコードのJSONスナップショット保存先
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(5),
            politeness_delay: Duration::from_secs(3)..=Duration::from_secs(7),
            max_plans_per_provider: 5,
            output_dir: PathBuf::from("."),
            snapshot_dir: None,
        }
    }
}

impl PricingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数で既定値を上書き
    ///
    /// - `CHROME_PATH` / `CHROMIUM_PATH`
    /// - `PRICING_OUTPUT_DIR`
    /// - `PRICING_HEADLESS` (`false` / `0` で表示モード)
    /// - `PRICING_SNAPSHOT_DIR`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH")) {
            config.chrome_path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("PRICING_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(value) = std::env::var("PRICING_HEADLESS") {
            config.headless = parse_flag(&value).unwrap_or(true);
        }
        if let Ok(dir) = std::env::var("PRICING_SNAPSHOT_DIR") {
            config.snapshot_dir = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_politeness_delay(mut self, delay: RangeInclusive<Duration>) -> Self {
        self.politeness_delay = delay;
        self
    }

    pub fn with_max_plans_per_provider(mut self, max: usize) -> Self {
        self.max_plans_per_provider = max;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// 待機なし設定（テスト用）
    pub fn without_delays(self) -> Self {
        self.with_settle_delay(Duration::ZERO)
            .with_politeness_delay(Duration::ZERO..=Duration::ZERO)
    }

    /// 範囲から一様にランダムな待機時間を選ぶ
    pub fn pick_politeness_delay(&self) -> Duration {
        let low = self.politeness_delay.start().as_millis() as u64;
        let high = self.politeness_delay.end().as_millis() as u64;
        if high <= low {
            return Duration::from_millis(low);
        }
        Duration::from_millis(fastrand::u64(low..=high))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
