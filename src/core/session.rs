//! 会话状态机：纯 reducer + 宿主驱动
//!
//! `reduce(state, event)` 不做任何 I/O；需要的副作用（调用工厂、跑一轮对话）由
//! `SessionState::pending_effect` 从状态推导，再由 `Session` 在 reducer 之外执行并把结果作为事件送回。
//!
//! 阶段转换：Uninitialized → Initializing → Ready ⇄ Generating；工厂失败时 Initializing → Uninitialized，
//! 对话失败同样回到 Ready（错误作为 assistant 消息记录）。

use std::sync::Arc;

use crate::agent::{AgentConfig, AgentFactory, AgentHandle, AgentKind};
use crate::core::conversation::respond;
use crate::core::state::{Notice, SessionPhase, SessionState};
use crate::memory::Message;

/// 未初始化时提交消息的提示
pub const NOT_INITIALIZED_WARNING: &str = "Please initialize an agent first!";

/// 生成中再次提交的提示
pub const BUSY_WARNING: &str = "Still working on the previous question, please wait.";

/// 送入 reducer 的事件
#[derive(Clone)]
pub enum SessionEvent {
    /// 设置面板提交（显式初始化，清空 Transcript）
    Initialize(AgentConfig),
    /// 每次渲染观测到的面板设置；已初始化且与当前设置不同则重新初始化
    SettingsObserved { kind: AgentKind, temperature: f32 },
    /// 工厂成功
    AgentReady(AgentHandle),
    /// 工厂失败，附带原始描述
    AgentFailed(String),
    /// 用户提交一条消息
    UserMessage(String),
    /// 宿主即将发起 respond
    TurnStarted,
    /// respond 返回（成功回复或错误文本）
    ReplyReceived(String),
    /// 清空 Transcript
    Clear,
}

/// 宿主需要执行的副作用
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    CreateAgent(AgentConfig),
    Respond(String),
}

impl SessionState {
    /// 根据当前状态推导下一步副作用
    pub fn pending_effect(&self) -> Option<Effect> {
        match self.phase {
            SessionPhase::Initializing => self.pending.clone().map(Effect::CreateAgent),
            SessionPhase::Ready if self.initialized && !self.generating && self.handle.is_some() => self
                .transcript
                .awaiting_reply()
                .map(|text| Effect::Respond(text.to_string())),
            _ => None,
        }
    }
}

/// 纯状态转换
pub fn reduce(mut state: SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::Initialize(config) => {
            if state.generating {
                return state;
            }
            state.transcript.clear();
            state.pending = Some(config);
            state.phase = SessionPhase::Initializing;
            state.notice = None;
        }
        SessionEvent::SettingsObserved { kind, temperature } => {
            if state.phase != SessionPhase::Ready || state.generating {
                return state;
            }
            if let Some(current) = &state.config {
                if current.settings_differ(kind, temperature) {
                    state.pending =
                        Some(AgentConfig::new(kind, temperature, current.credential.clone()));
                    state.phase = SessionPhase::Initializing;
                }
            }
        }
        SessionEvent::AgentReady(handle) => {
            if state.phase != SessionPhase::Initializing {
                return state;
            }
            let config = state.pending.take();
            state.notice = config
                .as_ref()
                .map(|c| Notice::Success(format!("{} initialized successfully!", c.kind)));
            state.config = config;
            state.handle = Some(handle);
            state.initialized = true;
            state.phase = SessionPhase::Ready;
        }
        SessionEvent::AgentFailed(description) => {
            if state.phase != SessionPhase::Initializing {
                return state;
            }
            state.pending = None;
            state.config = None;
            state.handle = None;
            state.initialized = false;
            state.phase = SessionPhase::Uninitialized;
            state.notice = Some(Notice::Error(format!(
                "Error initializing agent: {}",
                description
            )));
        }
        SessionEvent::UserMessage(text) => {
            if text.trim().is_empty() {
                return state;
            }
            if !state.initialized {
                state.notice = Some(Notice::Warning(NOT_INITIALIZED_WARNING.to_string()));
                return state;
            }
            if state.generating || state.transcript.awaiting_reply().is_some() {
                state.notice = Some(Notice::Warning(BUSY_WARNING.to_string()));
                return state;
            }
            state.transcript.push(Message::user(text));
            state.notice = None;
        }
        SessionEvent::TurnStarted => {
            if matches!(state.pending_effect(), Some(Effect::Respond(_))) {
                state.generating = true;
                state.phase = SessionPhase::Generating;
            }
        }
        SessionEvent::ReplyReceived(reply) => {
            if !state.generating {
                return state;
            }
            state.transcript.push(Message::assistant(reply));
            state.generating = false;
            state.phase = SessionPhase::Ready;
        }
        SessionEvent::Clear => {
            if !state.generating {
                state.transcript.clear();
                state.notice = None;
            }
        }
    }
    state
}

/// 宿主驱动：持有状态与工厂，执行 reducer 推导出的副作用
pub struct Session {
    state: SessionState,
    factory: Arc<dyn AgentFactory>,
}

impl Session {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            state: SessionState::default(),
            factory,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// 执行一个副作用；没有待执行的副作用时返回 false。
    /// observe 在每次阻塞调用之前收到当前状态（用于显示忙碌提示）。
    pub async fn step<F>(&mut self, observe: &mut F) -> bool
    where
        F: FnMut(&SessionState),
    {
        match self.state.pending_effect() {
            Some(Effect::CreateAgent(config)) => {
                observe(&self.state);
                tracing::info!(kind = %config.kind, temperature = config.temperature, "initializing agent");
                match self.factory.create(&config).await {
                    Ok(handle) => self.dispatch(SessionEvent::AgentReady(handle)),
                    Err(e) => {
                        tracing::warn!("agent initialization failed: {}", e);
                        self.dispatch(SessionEvent::AgentFailed(e.to_string()));
                    }
                }
                true
            }
            Some(Effect::Respond(text)) => {
                let Some(handle) = self.state.handle.clone() else {
                    return false;
                };
                self.dispatch(SessionEvent::TurnStarted);
                observe(&self.state);
                let reply = respond(&handle, &text).await;
                self.dispatch(SessionEvent::ReplyReceived(reply));
                true
            }
            None => false,
        }
    }

    /// 反复执行副作用直到状态稳定
    pub async fn settle_with<F>(&mut self, mut observe: F)
    where
        F: FnMut(&SessionState),
    {
        while self.step(&mut observe).await {}
    }

    pub async fn settle(&mut self) {
        self.settle_with(|_| {}).await;
    }

    /// 派发事件并执行随之产生的副作用
    pub async fn handle(&mut self, event: SessionEvent) {
        self.dispatch(event);
        self.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::agent::{ChatResult, FinancialAgent};
    use crate::core::AgentError;
    use crate::memory::Role;

    struct Echo(AgentKind);

    #[async_trait]
    impl FinancialAgent for Echo {
        fn name(&self) -> &str {
            self.0.as_str()
        }

        async fn initiate_chat(&self, message: &str) -> Result<ChatResult, AgentError> {
            Ok(ChatResult::with_summary(format!("{}: {}", self.0, message)))
        }

        async fn reset(&self) {}
    }

    #[derive(Default)]
    struct CountingFactory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentFactory for CountingFactory {
        async fn create(&self, config: &AgentConfig) -> Result<AgentHandle, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if config.credential == "bad" {
                return Err(AgentError::Initialization("401 invalid api key".to_string()));
            }
            Ok(Arc::new(Echo(config.kind)))
        }
    }

    fn ready_state() -> SessionState {
        let state = reduce(
            SessionState::default(),
            SessionEvent::Initialize(AgentConfig::new(AgentKind::MarketAnalyst, 0.5, "sk-x")),
        );
        reduce(state, SessionEvent::AgentReady(Arc::new(Echo(AgentKind::MarketAnalyst))))
    }

    #[test]
    fn test_initialize_transitions() {
        let state = reduce(
            SessionState::default(),
            SessionEvent::Initialize(AgentConfig::new(AgentKind::MarketAnalyst, 0.5, "sk-x")),
        );
        assert_eq!(state.phase, SessionPhase::Initializing);
        assert!(matches!(state.pending_effect(), Some(Effect::CreateAgent(_))));

        let ready = reduce(state.clone(), SessionEvent::AgentReady(Arc::new(Echo(AgentKind::MarketAnalyst))));
        assert_eq!(ready.phase, SessionPhase::Ready);
        assert!(ready.initialized && ready.handle.is_some());
        assert_eq!(
            ready.notice,
            Some(Notice::Success("Market_Analyst initialized successfully!".to_string()))
        );

        let failed = reduce(state, SessionEvent::AgentFailed("boom".to_string()));
        assert_eq!(failed.phase, SessionPhase::Uninitialized);
        assert!(!failed.initialized && failed.handle.is_none());
        assert_eq!(
            failed.notice,
            Some(Notice::Error("Error initializing agent: boom".to_string()))
        );
    }

    #[test]
    fn test_message_before_initialize_is_rejected() {
        let state = reduce(SessionState::default(), SessionEvent::UserMessage("hi".to_string()));
        assert!(state.transcript.is_empty());
        assert_eq!(
            state.notice,
            Some(Notice::Warning(NOT_INITIALIZED_WARNING.to_string()))
        );
        assert!(state.pending_effect().is_none());
    }

    #[test]
    fn test_no_second_turn_while_generating() {
        let state = reduce(ready_state(), SessionEvent::UserMessage("q1".to_string()));
        assert_eq!(state.pending_effect(), Some(Effect::Respond("q1".to_string())));

        let state = reduce(state, SessionEvent::TurnStarted);
        assert!(state.generating);
        assert_eq!(state.phase, SessionPhase::Generating);
        assert!(state.pending_effect().is_none());

        // 重复的 TurnStarted 与新的用户消息都不产生新一轮
        let state = reduce(state, SessionEvent::TurnStarted);
        let state = reduce(state, SessionEvent::UserMessage("q2".to_string()));
        assert_eq!(state.transcript.len(), 1);
        assert!(state.pending_effect().is_none());

        let state = reduce(state, SessionEvent::ReplyReceived("a1".to_string()));
        assert!(!state.generating);
        assert_eq!(state.phase, SessionPhase::Ready);
        assert_eq!(state.transcript.last().unwrap().role, Role::Assistant);
        assert!(state.pending_effect().is_none());
    }

    #[test]
    fn test_settings_change_requests_reinit() {
        let state = reduce(
            ready_state(),
            SessionEvent::SettingsObserved {
                kind: AgentKind::MarketAnalyst,
                temperature: 0.5,
            },
        );
        assert_eq!(state.phase, SessionPhase::Ready);

        let state = reduce(
            state,
            SessionEvent::SettingsObserved {
                kind: AgentKind::MarketAnalyst,
                temperature: 0.9,
            },
        );
        assert_eq!(state.phase, SessionPhase::Initializing);
        match state.pending_effect() {
            Some(Effect::CreateAgent(cfg)) => {
                assert!((cfg.temperature - 0.9).abs() < 1e-6);
                assert_eq!(cfg.credential, "sk-x");
            }
            other => panic!("expected CreateAgent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_turn() {
        let factory = Arc::new(CountingFactory::default());
        let mut session = Session::new(factory.clone());
        session
            .handle(SessionEvent::Initialize(AgentConfig::new(
                AgentKind::MarketAnalyst,
                0.5,
                "sk-x",
            )))
            .await;
        assert_eq!(session.state().phase, SessionPhase::Ready);

        session
            .handle(SessionEvent::UserMessage("What is the outlook for bonds?".to_string()))
            .await;
        let messages = session.state().transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("What is the outlook for bonds?"));
        assert_eq!(
            messages[1],
            Message::assistant("Market_Analyst: What is the outlook for bonds?")
        );
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_observer_sees_generating() {
        let mut session = Session::new(Arc::new(CountingFactory::default()));
        session
            .handle(SessionEvent::Initialize(AgentConfig::new(AgentKind::DataAnalyst, 0.1, "sk-x")))
            .await;
        session.dispatch(SessionEvent::UserMessage("q".to_string()));

        let mut seen = Vec::new();
        session.settle_with(|s| seen.push((s.phase, s.generating))).await;
        assert_eq!(seen, vec![(SessionPhase::Generating, true)]);
    }

    #[tokio::test]
    async fn test_failed_init_stays_uninitialized() {
        let factory = Arc::new(CountingFactory::default());
        let mut session = Session::new(factory.clone());
        session
            .handle(SessionEvent::Initialize(AgentConfig::new(AgentKind::ExpertInvestor, 0.7, "bad")))
            .await;
        let state = session.state();
        assert_eq!(state.phase, SessionPhase::Uninitialized);
        assert!(!state.initialized);
        assert!(state.notice.as_ref().unwrap().text().contains("401 invalid api key"));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }
}
