//! Agent 工厂：由设置面板产出的 AgentConfig 构建 AgentHandle
//!
//! 凭据只通过 AgentConfig 显式传入，不写入进程环境变量。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::{AgentHandle, AgentKind, AssistantOptions, FinancialAssistant};
use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

/// 一次初始化所需的全部设置
#[derive(Clone, PartialEq)]
pub struct AgentConfig {
    pub kind: AgentKind,
    /// [0, 1]
    pub temperature: f32,
    pub credential: String,
}

impl AgentConfig {
    pub fn new(kind: AgentKind, temperature: f32, credential: impl Into<String>) -> Self {
        Self {
            kind,
            temperature: clamp_temperature(temperature),
            credential: credential.into(),
        }
    }

    /// 角色或温度是否与 (kind, temperature) 不同；仅凭据变化不算
    pub fn settings_differ(&self, kind: AgentKind, temperature: f32) -> bool {
        self.kind != kind || (self.temperature - clamp_temperature(temperature)).abs() > 1e-6
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("kind", &self.kind)
            .field("temperature", &self.temperature)
            .field("credential", &"***")
            .finish()
    }
}

/// 限制在 [0, 1] 并按 0.1 取整
pub fn clamp_temperature(t: f32) -> f32 {
    if t.is_nan() {
        return 0.0;
    }
    (t.clamp(0.0, 1.0) * 10.0).round() / 10.0
}

/// 模型访问描述：模型标识 + 凭据 + 可选端点
#[derive(Clone)]
pub struct ModelEndpoint {
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

/// LLM 配置：候选端点列表 + 温度
#[derive(Clone)]
pub struct LlmConfig {
    pub config_list: Vec<ModelEndpoint>,
    pub temperature: f32,
}

/// 工厂接口；会话驱动只依赖它
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn create(&self, config: &AgentConfig) -> Result<AgentHandle, AgentError>;
}

/// 基于 LlmClient 的工厂（openai / mock）
#[derive(Debug, Clone)]
pub struct LlmAgentFactory {
    provider: String,
    model: String,
    base_url: Option<String>,
    timeout: Duration,
}

impl LlmAgentFactory {
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            provider: provider.to_lowercase(),
            model: model.to_string(),
            base_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let mut factory = Self::new(&cfg.llm.provider, &cfg.llm.model);
        factory.base_url = cfg.llm.base_url.clone();
        factory.timeout = Duration::from_secs(cfg.llm.request_timeout_secs);
        factory
    }

    /// 组装 LlmConfig（单端点，固定模型标识）
    pub fn llm_config(&self, config: &AgentConfig) -> LlmConfig {
        LlmConfig {
            config_list: vec![ModelEndpoint {
                model: self.model.clone(),
                api_key: config.credential.clone(),
                base_url: self.base_url.clone(),
            }],
            temperature: config.temperature,
        }
    }

    fn build_client(&self, llm_config: &LlmConfig) -> Result<Arc<dyn LlmClient>, AgentError> {
        let endpoint = llm_config.config_list.first().ok_or_else(|| {
            AgentError::Initialization("config_list is empty".to_string())
        })?;
        if endpoint.model.trim().is_empty() {
            return Err(AgentError::Initialization(
                "no model identifier configured".to_string(),
            ));
        }
        if endpoint.api_key.trim().is_empty() {
            return Err(AgentError::Initialization("API key is empty".to_string()));
        }

        match self.provider.as_str() {
            "openai" => Ok(Arc::new(
                OpenAiClient::new(
                    endpoint.base_url.as_deref(),
                    &endpoint.model,
                    &endpoint.api_key,
                )
                .with_temperature(llm_config.temperature)
                .with_timeout(self.timeout),
            )),
            "mock" => Ok(Arc::new(MockLlmClient)),
            other => Err(AgentError::Initialization(format!(
                "unknown LLM provider: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl AgentFactory for LlmAgentFactory {
    async fn create(&self, config: &AgentConfig) -> Result<AgentHandle, AgentError> {
        let llm_config = self.llm_config(config);
        let llm = self.build_client(&llm_config)?;
        tracing::info!(
            kind = %config.kind,
            model = llm.model(),
            temperature = llm_config.temperature,
            "constructing assistant"
        );
        let assistant = FinancialAssistant::new(config.kind, llm, AssistantOptions::default())?;
        Ok(Arc::new(assistant))
    }
}
