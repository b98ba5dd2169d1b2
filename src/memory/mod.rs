//! 记忆层：每个会话的内存 Transcript（不做持久化）

pub mod conversation;

pub use conversation::{Message, Role, Transcript};
