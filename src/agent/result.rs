//! 单轮对话结果与回复提取
//!
//! 结果可能带摘要，也可能只带历史；历史有两种形状：按时间的单一序列，或按对端分组的多条序列。
//! 提取顺序固定：非空摘要（仅空字符串视为缺失） > 历史中最近一条 assistant 消息 > 固定兜底文本。

use serde::{Deserialize, Serialize};

/// 找不到可读回复时返回的固定文本
pub const NO_READABLE_RESPONSE: &str =
    "I couldn't find a readable response from the agent. Please try rephrasing your question.";

/// 历史中的一条记录；字段都可能缺失
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl HistoryEntry {
    pub fn new(role: &str, name: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            name: name.map(String::from),
            content: Some(content.into()),
        }
    }

    fn is_from(&self, assistant_name: &str) -> bool {
        self.role.as_deref() == Some("assistant") || self.name.as_deref() == Some(assistant_name)
    }

    fn readable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// 历史形状
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum History {
    #[default]
    None,
    /// 按时间排列的单一序列
    Sequence(Vec<HistoryEntry>),
    /// 按对端名称分组，每组内按时间排列
    ByPeer(Vec<(String, Vec<HistoryEntry>)>),
}

/// initiate_chat 的返回
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatResult {
    pub summary: Option<String>,
    pub history: History,
}

impl ChatResult {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            history: History::None,
        }
    }

    pub fn with_history(history: History) -> Self {
        Self {
            summary: None,
            history,
        }
    }
}

/// 从最近一条开始，找 role 为 assistant 或 name 为 assistant_name 且内容非空的记录
fn last_from<'a>(entries: &'a [HistoryEntry], assistant_name: &str) -> Option<&'a str> {
    entries
        .iter()
        .rev()
        .filter(|e| e.is_from(assistant_name))
        .find_map(HistoryEntry::readable_content)
}

/// 按固定顺序提取最终回复
pub fn extract_reply(result: &ChatResult, assistant_name: &str) -> String {
    if let Some(summary) = result.summary.as_deref() {
        if !summary.is_empty() {
            return summary.to_string();
        }
    }

    let found = match &result.history {
        History::None => None,
        History::Sequence(entries) => last_from(entries, assistant_name),
        History::ByPeer(groups) => {
            // 助手自己那一组优先，其余按原顺序
            let own = groups
                .iter()
                .filter(|(peer, _)| peer == assistant_name)
                .find_map(|(_, entries)| last_from(entries, assistant_name));
            own.or_else(|| {
                groups
                    .iter()
                    .filter(|(peer, _)| peer != assistant_name)
                    .find_map(|(_, entries)| last_from(entries, assistant_name))
            })
        }
    };

    found
        .map(String::from)
        .unwrap_or_else(|| NO_READABLE_RESPONSE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "Market_Analyst";

    #[test]
    fn test_summary_wins() {
        let result = ChatResult {
            summary: Some("X".to_string()),
            history: History::Sequence(vec![HistoryEntry::new("assistant", None, "Y")]),
        };
        assert_eq!(extract_reply(&result, NAME), "X");
    }

    #[test]
    fn test_empty_summary_falls_back_to_history() {
        let result = ChatResult {
            summary: Some(String::new()),
            history: History::Sequence(vec![
                HistoryEntry::new("user", None, "What is the outlook for bonds?"),
                HistoryEntry::new("assistant", None, "Y"),
            ]),
        };
        assert_eq!(extract_reply(&result, NAME), "Y");
    }

    #[test]
    fn test_whitespace_summary_is_still_a_summary() {
        let result = ChatResult {
            summary: Some(" ".to_string()),
            history: History::Sequence(vec![HistoryEntry::new("assistant", None, "Y")]),
        };
        assert_eq!(extract_reply(&result, NAME), " ");
    }

    #[test]
    fn test_history_scanned_from_end() {
        let result = ChatResult::with_history(History::Sequence(vec![
            HistoryEntry::new("assistant", None, "first"),
            HistoryEntry::new("user", None, "more"),
            HistoryEntry::new("assistant", None, "second"),
            HistoryEntry::new("user", None, "thanks"),
        ]));
        assert_eq!(extract_reply(&result, NAME), "second");
    }

    #[test]
    fn test_match_by_name() {
        let result = ChatResult::with_history(History::Sequence(vec![
            HistoryEntry::new("user", Some("User_Proxy"), "q"),
            HistoryEntry::new("user", Some(NAME), "from the analyst"),
        ]));
        assert_eq!(extract_reply(&result, NAME), "from the analyst");
    }

    #[test]
    fn test_blank_assistant_entries_skipped() {
        let result = ChatResult::with_history(History::Sequence(vec![
            HistoryEntry::new("assistant", None, "real"),
            HistoryEntry::new("assistant", None, "   "),
            HistoryEntry {
                role: Some("assistant".to_string()),
                name: None,
                content: None,
            },
        ]));
        assert_eq!(extract_reply(&result, NAME), "real");
    }

    #[test]
    fn test_by_peer_prefers_own_group() {
        let result = ChatResult::with_history(History::ByPeer(vec![
            (
                "User_Proxy".to_string(),
                vec![HistoryEntry::new("assistant", None, "proxy view")],
            ),
            (
                NAME.to_string(),
                vec![
                    HistoryEntry::new("user", None, "q"),
                    HistoryEntry::new("assistant", None, "own view"),
                ],
            ),
        ]));
        assert_eq!(extract_reply(&result, NAME), "own view");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(extract_reply(&ChatResult::default(), NAME), NO_READABLE_RESPONSE);

        let only_user = ChatResult {
            summary: Some(String::new()),
            history: History::Sequence(vec![HistoryEntry::new("user", None, "hello")]),
        };
        assert_eq!(extract_reply(&only_user, NAME), NO_READABLE_RESPONSE);
    }
}
