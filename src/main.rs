//! FinBee - 金融智能体对话 TUI
//!
//! 入口：加载配置、初始化日志（写文件）、创建会话编排器与 TUI，并运行主循环。

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use finbee::agent::LlmAgentFactory;
use finbee::config::{load_config, AppConfig};
use finbee::core::create_agent;
use finbee::observability;
use finbee::ui::{run_app, ConfigPanel, Titles};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_file(Path::new("finbee.log")).context("Failed to open finbee.log")?;

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    tracing::info!(provider = %cfg.llm.provider, model = %cfg.llm.model, "starting finbee");

    let factory = Arc::new(LlmAgentFactory::from_config(&cfg));
    let (cmd_tx, state_rx) = create_agent(factory);

    // 凭据只在启动时读取一次，之后随 AgentConfig 显式传递
    let panel = ConfigPanel::new(
        cfg.agent.default_kind,
        cfg.agent.default_temperature,
        cfg.llm.initial_credential(),
    );
    let titles = Titles {
        title: cfg.app.title.clone(),
        subtitle: cfg.app.subtitle.clone(),
    };

    run_app(state_rx, cmd_tx, panel, titles)
        .await
        .context("App run failed")?;

    Ok(())
}
