//! 错误类型
//!
//! 两类用户可见的失败：初始化失败（页面级提示，会话回到 Uninitialized）与对话失败
//! （合成一条 assistant 消息，会话保持 Ready）。两者都在产生处被转换为文本，不会终止进程。

use thiserror::Error;

/// 会话与 Agent 调用过程中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// 设置面板提交时凭据为空
    #[error("Please provide an API key before initializing the agent")]
    MissingCredential,

    /// Agent 工厂构建失败（凭据无效、配置错误、后端不可用等）
    #[error("{0}")]
    Initialization(String),

    /// 单轮对话失败（后端返回的原始描述）
    #[error("{0}")]
    Response(String),
}
