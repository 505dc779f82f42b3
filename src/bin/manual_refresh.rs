// Small dev utility: run one full dataset refresh against a live analysis service.
//
// Usage:
//   SHEARWALL_BASE_URL=http://host:8000 cargo run --bin manual_refresh -- [session_id]
//
// This is intentionally lightweight and does not drive any UI.

use shearwall_client::app::AppState;
use shearwall_client::config::ClientConfig;
use shearwall_client::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut config = ClientConfig::load().map_err(|e| anyhow::anyhow!("配置加载失败: {}", e))?;

    // 命令行参数优先于配置/环境变量
    if let Some(session) = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        config.session_id = Some(session);
    }

    if config.session_id.is_none() {
        anyhow::bail!("缺少会话 ID (传参或设置 SHEARWALL_SESSION_ID)");
    }

    let state = AppState::new(config)?;
    let summary = state.orchestrator.refresh().await?;

    println!(
        "elements={} pruned_expansions={} rearmed_fetches={} elapsed_ms={}",
        summary.element_count,
        summary.pruned_expansions,
        summary.rearmed_fetches,
        summary.elapsed_ms
    );
    Ok(())
}
