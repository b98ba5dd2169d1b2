//! FinBee - 金融智能体对话前端
//!
//! 模块划分：
//! - **agent**: 智能体角色、工厂、基于 LLM 的助手实现、结果提取与输出抑制
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、会话状态机（reducer + 宿主驱动）、对话循环、TUI 编排器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 每个会话的内存 Transcript
//! - **observability**: 日志初始化
//! - **ui**: Ratatui TUI 界面（设置面板、对话区、渲染）

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod ui;
