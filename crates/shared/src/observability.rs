//! # ログ出力の初期化
//!
//! `LOG_FORMAT`（`json` / `pretty`）と `RUST_LOG` を読み取り、
//! グローバルな tracing subscriber を 1 度だけ登録する。

use std::str::FromStr;

/// `RUST_LOG` が未設定のときのフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info,saferoute=debug,tower_http=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 イベント 1 行の JSON
    Json,
    /// 端末向けの整形出力
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "" => Ok(Self::Pretty),
            other => Err(other.to_string()),
        }
    }
}

/// subscriber の設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    pub log_format:   LogFormat,
    /// `RUST_LOG` 相当のフィルタ式
    pub filter:       String,
}

impl TracingConfig {
    /// 環境変数から組み立てる
    ///
    /// subscriber 登録前に呼ばれるため、`LOG_FORMAT` の不正値は
    /// stderr に書き出して `pretty` で続行する。
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse().unwrap_or_else(|bad: String| {
                eprintln!("LOG_FORMAT={bad:?} は未対応のため pretty で出力します");
                LogFormat::Pretty
            }),
            Err(_) => LogFormat::default(),
        };
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self {
            service_name: service_name.into(),
            log_format,
            filter,
        }
    }
}

/// subscriber を登録する
///
/// `ErrorLayer` を含めるので、`InfraError` は生成時点の `SpanTrace` を保持できる。
/// フィルタ式が解釈できない場合は [`DEFAULT_LOG_FILTER`] を使う。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::info!(
        service = %config.service_name,
        format = ?config.log_format,
        filter = %config.filter,
        "ログ出力を開始しました"
    );
}
