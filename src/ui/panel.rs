//! 设置面板：角色下拉、温度滑块、凭据输入与 Initialize 按钮
//!
//! 角色只能从固定列表中选择，温度由控件自身限制在 [0, 1]、步长 0.1；提交时只校验凭据非空。

use crate::agent::{clamp_temperature, AgentConfig, AgentKind};
use crate::core::AgentError;

/// 温度步长
pub const TEMPERATURE_STEP: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct ConfigPanel {
    kind_index: usize,
    temperature: f32,
    credential: String,
}

impl Default for ConfigPanel {
    fn default() -> Self {
        Self::new(AgentKind::default(), 0.7, String::new())
    }
}

impl ConfigPanel {
    pub fn new(kind: AgentKind, temperature: f32, credential: impl Into<String>) -> Self {
        Self {
            kind_index: kind.index(),
            temperature: clamp_temperature(temperature),
            credential: credential.into(),
        }
    }

    pub fn kind(&self) -> AgentKind {
        AgentKind::ALL[self.kind_index]
    }

    pub fn kind_index(&self) -> usize {
        self.kind_index
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// 当前 (角色, 温度)，宿主每次渲染都拿它判断设置是否变化
    pub fn settings(&self) -> (AgentKind, f32) {
        (self.kind(), self.temperature)
    }

    pub fn select_prev(&mut self) {
        self.kind_index = self.kind_index.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        self.kind_index = (self.kind_index + 1).min(AgentKind::ALL.len() - 1);
    }

    pub fn set_temperature(&mut self, t: f32) {
        self.temperature = clamp_temperature(t);
    }

    pub fn temperature_up(&mut self) {
        self.set_temperature(self.temperature + TEMPERATURE_STEP);
    }

    pub fn temperature_down(&mut self) {
        self.set_temperature(self.temperature - TEMPERATURE_STEP);
    }

    pub fn push_credential_char(&mut self, c: char) {
        self.credential.push(c);
    }

    pub fn pop_credential_char(&mut self) {
        self.credential.pop();
    }

    /// 凭据显示为等长的掩码
    pub fn masked_credential(&self) -> String {
        "•".repeat(self.credential.chars().count())
    }

    /// Initialize：凭据为空时返回 MissingCredential，不产生任何配置
    pub fn submit(&self) -> Result<AgentConfig, AgentError> {
        let credential = self.credential.trim();
        if credential.is_empty() {
            return Err(AgentError::MissingCredential);
        }
        Ok(AgentConfig::new(self.kind(), self.temperature, credential))
    }
}
