//! Agent 层：角色、工厂、助手实现、结果提取与输出抑制

pub mod assistant;
pub mod capture;
pub mod factory;
pub mod kind;
pub mod result;

pub use assistant::{
    AgentHandle, AssistantOptions, CodeExecution, FinancialAgent, FinancialAssistant,
    HumanInputMode,
};
pub use capture::quietly;
pub use factory::{clamp_temperature, AgentConfig, AgentFactory, LlmAgentFactory, LlmConfig, ModelEndpoint};
pub use kind::AgentKind;
pub use result::{extract_reply, ChatResult, History, HistoryEntry, NO_READABLE_RESPONSE};
