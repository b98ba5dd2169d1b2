//! 金融智能体角色：固定的 5 种，每种带一段角色描述作为 system prompt

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 可选的智能体角色（设置面板中的下拉项，顺序固定）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[default]
    #[serde(rename = "Expert_Investor")]
    ExpertInvestor,
    #[serde(rename = "Market_Analyst")]
    MarketAnalyst,
    #[serde(rename = "Financial_Analyst")]
    FinancialAnalyst,
    #[serde(rename = "Data_Analyst")]
    DataAnalyst,
    #[serde(rename = "Artificial_Intelligence_Engineer")]
    AiEngineer,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::ExpertInvestor,
        AgentKind::MarketAnalyst,
        AgentKind::FinancialAnalyst,
        AgentKind::DataAnalyst,
        AgentKind::AiEngineer,
    ];

    /// 对外标识（也是下拉项显示文本与 Agent 名称）
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::ExpertInvestor => "Expert_Investor",
            AgentKind::MarketAnalyst => "Market_Analyst",
            AgentKind::FinancialAnalyst => "Financial_Analyst",
            AgentKind::DataAnalyst => "Data_Analyst",
            AgentKind::AiEngineer => "Artificial_Intelligence_Engineer",
        }
    }

    /// 在 ALL 中的下标
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    /// 角色描述，首行为头衔
    pub fn profile(&self) -> &'static str {
        match self {
            AgentKind::ExpertInvestor => {
                "As an Expert Investor, you are proficient in the following:\n\
                 1. Combine multiple data sources for a comprehensive view of a company.\n\
                 2. Evaluate valuation, risk and growth prospects before recommending any position.\n\
                 3. Explain the reasoning behind each conclusion in plain language."
            }
            AgentKind::MarketAnalyst => {
                "As a Market Analyst, one must possess strong analytical and problem-solving abilities,\n\
                 collect necessary financial information and aggregate it based on the client's requirement.\n\
                 Focus on market trends, sector rotation, rates and macro indicators."
            }
            AgentKind::FinancialAnalyst => {
                "As a Financial Analyst, you read financial statements with care:\n\
                 income statement, balance sheet and cash flow. Summarise profitability,\n\
                 leverage and liquidity, and point out anything unusual."
            }
            AgentKind::DataAnalyst => {
                "As a Data Analyst, you turn financial data into clear findings.\n\
                 Describe the data you would need, the method you would apply and\n\
                 what the result means for the question asked."
            }
            AgentKind::AiEngineer => {
                "As an Artificial Intelligence Engineer, you design and explain machine\n\
                 learning approaches for finance problems: features, models, evaluation\n\
                 and the limits of what a model can say about markets."
            }
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown agent kind: {}", s))
    }
}
