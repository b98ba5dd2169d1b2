//! 对话循环：单轮请求/回复
//!
//! respond 从不返回错误：Agent 失败时返回一条固定格式的道歉文本，由会话作为 assistant 消息追加。

use crate::agent::{extract_reply, quietly, AgentHandle, FinancialAgent};

/// 对话失败时回复的前缀
pub const ERROR_REPLY_PREFIX: &str = "Sorry, I encountered an error: ";

/// 跑一轮：静默调用 initiate_chat，提取回复，然后 reset，使下一轮不带任何上文
pub async fn respond(handle: &AgentHandle, user_text: &str) -> String {
    let outcome = quietly(handle.initiate_chat(user_text)).await;

    let reply = match outcome {
        Ok(result) => extract_reply(&result, handle.name()),
        Err(e) => {
            tracing::warn!(agent = handle.name(), "chat turn failed: {}", e);
            format!("{}{}", ERROR_REPLY_PREFIX, e)
        }
    };

    handle.reset().await;
    reply
}
