//! # PostgreSQL データベース接続管理
//!
//! 接続プールはプロセス起動時に一度だけ作成し、各リポジトリへ注入する。
//! シャットダウン時は `PgPool::close` でドレインする。

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

/// PostgreSQL 接続プールを作成する
///
/// # 設定値
///
/// - `max_connections(10)`: 最大接続数
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト。超過時はエラー
///
/// 接続はリクエストごとにプールから借り、完了時（エラー時も含む）に返却される。
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` マクロで埋め込まれたマイグレーションファイルを
/// 順番に適用する。適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
