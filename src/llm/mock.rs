//! Mock LLM 客户端（用于测试与离线演示，无需 API）
//!
//! 取最后一条 User 消息，按 system prompt 中的角色名生成一段固定格式的回复，末尾带 TERMINATE。

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        let persona = messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.lines().next())
            .unwrap_or("assistant");

        Ok(format!(
            "[mock] {}\nYou asked: {}\nTERMINATE",
            persona, last_user
        ))
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_last_user_message() {
        let reply = MockLlmClient
            .complete(&[
                Message::system("As a Market Analyst, you..."),
                Message::user("first"),
                Message::assistant("ok"),
                Message::user("bonds?"),
            ])
            .await
            .unwrap();
        assert!(reply.contains("You asked: bonds?"));
        assert!(reply.contains("Market Analyst"));
    }
}
