//! 角色化金融助手
//!
//! FinancialAgent 是会话层唯一依赖的 Agent 接口：initiate_chat 跑一轮请求/回复，reset 清空本轮状态。
//! FinancialAssistant 是基于 LlmClient 的实现：角色描述作为 system prompt，不接受人工输入，不执行代码。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::agent::result::{ChatResult, History, HistoryEntry};
use crate::agent::AgentKind;
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 对端（代发用户消息的一方）名称
pub const USER_PROXY_NAME: &str = "User_Proxy";

/// 回复结束标记
const TERMINATE: &str = "TERMINATE";

/// 会话层看到的 Agent 接口
#[async_trait]
pub trait FinancialAgent: Send + Sync {
    /// Agent 名称（历史记录中 name 字段的取值）
    fn name(&self) -> &str;

    /// 跑一轮请求/回复
    async fn initiate_chat(&self, message: &str) -> Result<ChatResult, AgentError>;

    /// 清空本轮状态，下一次 initiate_chat 从头开始
    async fn reset(&self);
}

/// 会话持有的 Agent 句柄；重新初始化时直接替换，不做显式销毁
pub type AgentHandle = Arc<dyn FinancialAgent>;

/// 人工输入模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HumanInputMode {
    Never,
    Always,
}

/// 代码执行配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeExecution {
    Disabled,
    Local { work_dir: String },
}

/// 构造参数
#[derive(Clone, Debug)]
pub struct AssistantOptions {
    pub human_input_mode: HumanInputMode,
    pub code_execution: CodeExecution,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            human_input_mode: HumanInputMode::Never,
            code_execution: CodeExecution::Disabled,
        }
    }
}

pub struct FinancialAssistant {
    kind: AgentKind,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    /// 本轮交换的消息；reset 时清空
    exchange: Mutex<Vec<HistoryEntry>>,
}

impl FinancialAssistant {
    /// 构建助手；页面没有人工输入通道，也不允许在本机执行代码
    pub fn new(
        kind: AgentKind,
        llm: Arc<dyn LlmClient>,
        options: AssistantOptions,
    ) -> Result<Self, AgentError> {
        if options.human_input_mode != HumanInputMode::Never {
            return Err(AgentError::Initialization(
                "human input is not available in this front-end".to_string(),
            ));
        }
        if let CodeExecution::Local { work_dir } = &options.code_execution {
            return Err(AgentError::Initialization(format!(
                "local code execution is disabled (requested work_dir: {})",
                work_dir
            )));
        }

        let system_prompt = format!(
            "{}\nToday's date is {}.\nReply {} when the task is done.",
            kind.profile(),
            chrono::Local::now().format("%Y-%m-%d"),
            TERMINATE
        );

        Ok(Self {
            kind,
            llm,
            system_prompt,
            exchange: Mutex::new(Vec::new()),
        })
    }
}

/// 去掉回复末尾的 TERMINATE 标记
fn strip_terminate(reply: &str) -> &str {
    let trimmed = reply.trim_end();
    trimmed
        .strip_suffix(TERMINATE)
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

#[async_trait]
impl FinancialAgent for FinancialAssistant {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn initiate_chat(&self, message: &str) -> Result<ChatResult, AgentError> {
        let mut exchange = self.exchange.lock().await;
        exchange.push(HistoryEntry::new("user", Some(USER_PROXY_NAME), message));
        tracing::info!(
            "{} (to {}):\n{}",
            USER_PROXY_NAME,
            self.name(),
            message
        );

        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(exchange.iter().filter_map(|e| {
            let content = e.content.clone()?;
            Some(match e.role.as_deref() {
                Some("assistant") => Message::assistant(content),
                _ => Message::user(content),
            })
        }));

        let raw = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::Response)?;
        tracing::info!("{} (to {}):\n{}", self.name(), USER_PROXY_NAME, raw);

        let reply = strip_terminate(&raw).to_string();
        exchange.push(HistoryEntry::new("assistant", Some(self.name()), reply.clone()));

        Ok(ChatResult {
            summary: Some(reply).filter(|r| !r.trim().is_empty()),
            history: History::Sequence(exchange.clone()),
        })
    }

    async fn reset(&self) {
        self.exchange.lock().await.clear();
    }
}
