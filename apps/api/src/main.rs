//! # SafeRoute API サーバー
//!
//! 市民によるインシデント報告を受け付ける HTTP API サーバー。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p saferoute-api
//!
//! # 本番環境
//! API_HOST=0.0.0.0 PORT=3000 JWT_SECRET=... ./saferoute-api
//! ```
//!
//! 起動時にマイグレーションを適用する。失敗した場合はプロセスを終了する。

use std::{net::SocketAddr, sync::Arc};

use saferoute_api::{
    app_builder::{AppDependencies, build_app},
    config::ApiConfig,
};
use saferoute_domain::clock::SystemClock;
use saferoute_infra::{
    Argon2PasswordHasher,
    JwtTokenService,
    db,
    repository::{
        PostgresCommentRepository,
        PostgresFacilityRepository,
        PostgresNotificationRepository,
        PostgresReportRepository,
        PostgresUserRepository,
    },
};
use saferoute_shared::observability::{TracingConfig, init_tracing};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("saferoute-api"));

    let config = ApiConfig::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET が未設定のため既定値で署名します。本番環境では必ず設定してください");
    }

    tracing::info!(
        "SafeRoute API サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool: sqlx::PgPool = db::create_pool(&config.database_url).await?;
    tracing::info!("データベースに接続しました");

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!(error = %e, "マイグレーションの適用に失敗しました");
        std::process::exit(1);
    }

    let hasher = Arc::new(Argon2PasswordHasher::new()?);
    let token_service = Arc::new(JwtTokenService::new(
        &config.jwt_secret,
        chrono::Duration::days(config.token_ttl_days),
    ));

    let app = build_app(AppDependencies {
        user_repository:         Arc::new(PostgresUserRepository::new(pool.clone())),
        report_repository:       Arc::new(PostgresReportRepository::new(pool.clone())),
        comment_repository:      Arc::new(PostgresCommentRepository::new(pool.clone())),
        facility_repository:     Arc::new(PostgresFacilityRepository::new(pool.clone())),
        notification_repository: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        password_hasher:         hasher.clone(),
        password_checker:        hasher,
        token_service,
        clock:                   Arc::new(SystemClock),
        request_timeout:         config.request_timeout,
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("SafeRoute API サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("サーバーを停止しました");

    Ok(())
}

/// Ctrl+C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C ハンドラの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl+C を受信しました。停止します"),
        () = terminate => tracing::info!("SIGTERM を受信しました。停止します"),
    }
}
