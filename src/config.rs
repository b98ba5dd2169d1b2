//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FINBEE__*` 覆盖（双下划线表示嵌套，如 `FINBEE__LLM__PROVIDER=mock`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::agent::AgentKind;

/// 默认模型标识（与原 FinRobot 页面保持一致）
pub const DEFAULT_MODEL: &str = "gpt-4-0125-preview";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub web: WebSection,
}

/// [app] 段：标题与副标题
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
        }
    }
}

fn default_title() -> String {
    "FinRobot Chatbot".to_string()
}

fn default_subtitle() -> String {
    "Your AI Finance Assistant".to_string()
}

/// [llm] 段：后端、模型、凭据与超时
#[derive(Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 预填到设置面板的凭据；未设置时回退到 OPENAI_API_KEY
    pub api_key: Option<String>,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for LlmSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSection")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl LlmSection {
    /// 启动时的凭据来源：配置文件 > OPENAI_API_KEY；只读取一次，之后显式传递
    pub fn initial_credential(&self) -> String {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default()
    }
}

/// [agent] 段：设置面板的初始值
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default)]
    pub default_kind: AgentKind,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            default_kind: AgentKind::default(),
            default_temperature: default_temperature(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

/// [web] 段：finbee-web 监听端口
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8501
}

/// 从 config 目录加载配置，环境变量 FINBEE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FINBEE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FINBEE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.model, DEFAULT_MODEL);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.agent.default_kind, AgentKind::ExpertInvestor);
        assert!((cfg.agent.default_temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[llm]\nprovider = \"mock\"\nmodel = \"gpt-4o\"\n\n[agent]\ndefault_kind = \"Market_Analyst\"\ndefault_temperature = 0.3"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.model, "gpt-4o");
        assert_eq!(cfg.agent.default_kind, AgentKind::MarketAnalyst);
        assert!((cfg.agent.default_temperature - 0.3).abs() < 1e-6);
        assert_eq!(cfg.web.port, 8501);
    }

    #[test]
    fn test_debug_masks_api_key() {
        let section = LlmSection {
            api_key: Some("sk-secret".to_string()),
            ..LlmSection::default()
        };
        let printed = format!("{:?}", section);
        assert!(!printed.contains("sk-secret"));
    }
}
