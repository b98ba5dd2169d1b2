//! 核心层：错误、会话状态机（纯 reducer + 宿主驱动）、对话循环、TUI 编排器

pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod state;

pub use conversation::{respond, ERROR_REPLY_PREFIX};
pub use error::AgentError;
pub use orchestrator::{create_agent, Command};
pub use session::{reduce, Effect, Session, SessionEvent};
pub use state::{Notice, SessionPhase, SessionState, UiState};
