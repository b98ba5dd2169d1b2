//! 状态定义：SessionState 与 UI 投影
//!
//! SessionState 只由 reducer 修改；前端只看轻量的 UiState（阶段、历史、忙碌标记、提示）。

use serde::Serialize;

use crate::agent::{AgentConfig, AgentHandle, AgentKind, FinancialAgent};
use crate::memory::{Message, Transcript};

/// 会话阶段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Generating,
}

/// 页面级提示（成功 / 警告 / 错误）
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "text", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

/// 单个会话的完整状态
///
/// - `generating` 只在「用户消息已追加」到「回复已追加」之间为 true
/// - `initialized` 为 false 时 `handle` 必为 None
#[derive(Clone, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub transcript: Transcript,
    /// 当前 handle 对应的设置
    pub config: Option<AgentConfig>,
    /// 等待工厂构建的设置（Initializing 阶段）
    pub pending: Option<AgentConfig>,
    pub handle: Option<AgentHandle>,
    pub initialized: bool,
    pub generating: bool,
    pub notice: Option<Notice>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase)
            .field("transcript", &self.transcript.len())
            .field("config", &self.config)
            .field("pending", &self.pending)
            .field("handle", &self.handle.as_ref().map(|h| h.name().to_string()))
            .field("initialized", &self.initialized)
            .field("generating", &self.generating)
            .field("notice", &self.notice)
            .finish()
    }
}

impl SessionState {
    /// 投影为 UI 状态
    pub fn project(&self) -> UiState {
        UiState {
            phase: self.phase,
            history: self.transcript.messages().to_vec(),
            agent: self.config.as_ref().map(|c| c.kind),
            temperature: self.config.as_ref().map(|c| c.temperature),
            busy: matches!(
                self.phase,
                SessionPhase::Initializing | SessionPhase::Generating
            ),
            notice: self.notice.clone(),
        }
    }
}

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Default, Serialize)]
pub struct UiState {
    pub phase: SessionPhase,
    pub history: Vec<Message>,
    pub agent: Option<AgentKind>,
    pub temperature: Option<f32>,
    /// 正在初始化或生成回复，输入应锁定并显示忙碌提示
    pub busy: bool,
    pub notice: Option<Notice>,
}
