//! 会话编排器：TUI 的宿主循环
//!
//! 建立 cmd/state 两条通道，在后台任务中按顺序消费用户命令（Initialize/Settings/Submit/Clear/Quit），
//! 交给 Session 执行副作用，并把每次变化投影为 UiState 推给界面。命令逐条处理，一轮对话结束前不会开始下一轮。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::agent::{AgentConfig, AgentFactory, AgentKind};
use crate::core::{Session, SessionEvent, UiState};

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 设置面板点击 Initialize
    Initialize(AgentConfig),
    /// 面板上的角色 / 温度发生变化
    Settings { kind: AgentKind, temperature: f32 },
    /// 提交用户输入
    Submit(String),
    /// 清空对话
    Clear,
    /// 退出应用
    Quit,
}

impl Command {
    /// 转为会话事件；Quit 没有对应事件
    fn into_event(self) -> Option<SessionEvent> {
        match self {
            Command::Initialize(config) => Some(SessionEvent::Initialize(config)),
            Command::Settings { kind, temperature } => {
                Some(SessionEvent::SettingsObserved { kind, temperature })
            }
            Command::Submit(text) => Some(SessionEvent::UserMessage(text)),
            Command::Clear => Some(SessionEvent::Clear),
            Command::Quit => None,
        }
    }
}

/// 创建会话运行时：返回命令发送端与状态接收端；后台任务消费命令并更新 state。
pub fn create_agent(
    factory: Arc<dyn AgentFactory>,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(UiState::default());

    tokio::spawn(async move {
        let mut session = Session::new(factory);
        while let Some(cmd) = cmd_rx.recv().await {
            let Some(event) = cmd.into_event() else {
                break;
            };
            session.dispatch(event);
            let _ = state_tx.send(session.state().project());

            // 执行副作用；每次阻塞调用前推送一次，让界面显示忙碌提示
            session
                .settle_with(|s| {
                    let _ = state_tx.send(s.project());
                })
                .await;
            let _ = state_tx.send(session.state().project());
        }
        tracing::info!("session loop stopped");
    });

    (cmd_tx, state_rx)
}
