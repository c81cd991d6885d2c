//! todo-api バイナリのエントリポイント
//! 環境変数から設定を読み込み、HTTP サーバを起動します。

use anyhow::Context;
use shared::{init_tracing, Config};
use todo_api::{app_with_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(config.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let state = AppState::from_config(&config).await;
    let addr = config.socket_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, environment = %config.environment, "server starting");

    axum::serve(listener, app_with_state(state))
        .await
        .context("server error")?;
    Ok(())
}
