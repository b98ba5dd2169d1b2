//! FinBee Web UI
//!
//! 启动: cargo run --bin finbee-web --features web
//! 浏览器访问 http://127.0.0.1:8501
//!
//! 每个浏览器标签页在打开时申请一个 session_id，拥有独立的 Session；同一会话的请求串行处理。
//! 标签页关闭（pagehide）时页面调用 /api/session/close 释放该会话。

#![cfg(feature = "web")]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use finbee::agent::{AgentFactory, AgentKind, LlmAgentFactory};
use finbee::config::{load_config, AppConfig};
use finbee::core::{Session, SessionEvent, UiState};
use finbee::observability;
use finbee::ui::{transcript_rows, ConfigPanel, Row};

struct AppState {
    config: AppConfig,
    factory: Arc<dyn AgentFactory>,
    /// 服务端凭据（配置或 OPENAI_API_KEY），页面未填写时使用；不会回传给浏览器
    server_credential: String,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

type ApiError = (StatusCode, String);

#[derive(Debug, Serialize)]
struct AgentsResponse {
    agents: Vec<AgentKind>,
    default_kind: AgentKind,
    default_temperature: f32,
    /// 服务端是否已有凭据（页面据此决定是否必须填写）
    server_credential: bool,
    title: String,
    subtitle: String,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct InitRequest {
    session_id: String,
    kind: AgentKind,
    temperature: f32,
    #[serde(default)]
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SettingsRequest {
    session_id: String,
    kind: AgentKind,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    state: UiState,
    rows: Vec<Row>,
}

impl StateResponse {
    fn from_state(state: UiState) -> Self {
        let rows = transcript_rows(&state.history);
        Self { state, rows }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let port = cfg.web.port;
    let factory: Arc<dyn AgentFactory> = Arc::new(LlmAgentFactory::from_config(&cfg));
    let state = Arc::new(AppState {
        server_credential: cfg.llm.initial_credential(),
        config: cfg,
        factory,
        sessions: RwLock::new(HashMap::new()),
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FinBee Web UI: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/agents", get(api_agents))
        .route("/api/session", post(api_session_create))
        .route("/api/session/close", post(api_session_close))
        .route("/api/state", get(api_state))
        .route("/api/init", post(api_init))
        .route("/api/settings", post(api_settings))
        .route("/api/chat", post(api_chat))
        .route("/api/clear", post(api_clear))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

async fn api_agents(State(state): State<Arc<AppState>>) -> Json<AgentsResponse> {
    Json(AgentsResponse {
        agents: AgentKind::ALL.to_vec(),
        default_kind: state.config.agent.default_kind,
        default_temperature: state.config.agent.default_temperature,
        server_credential: !state.server_credential.trim().is_empty(),
        title: state.config.app.title.clone(),
        subtitle: state.config.app.subtitle.clone(),
    })
}

async fn api_session_create(State(state): State<Arc<AppState>>) -> Json<SessionCreated> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let session = Session::new(state.factory.clone());
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), Arc::new(Mutex::new(session)));
    tracing::info!(%session_id, "session created");
    Json(SessionCreated { session_id })
}

/// POST /api/session/close：标签页关闭时移除会话（连同 Agent 句柄与 Transcript）；未知 id 视为已关闭
async fn api_session_close(
    State(state): State<Arc<AppState>>,
    Json(q): Json<SessionQuery>,
) -> StatusCode {
    if state.sessions.write().await.remove(&q.session_id).is_some() {
        tracing::info!(session_id = %q.session_id, "session closed");
    }
    StatusCode::OK
}

async fn find_session(state: &AppState, session_id: &str) -> Result<Arc<Mutex<Session>>, ApiError> {
    state
        .sessions
        .read()
        .await
        .get(session_id)
        .cloned()
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown session: {}", session_id)))
}

/// 派发事件并跑完副作用；会话锁在整轮期间持有，同一标签页的请求依次执行
async fn drive(
    state: &AppState,
    session_id: &str,
    event: SessionEvent,
) -> Result<Json<StateResponse>, ApiError> {
    let session = find_session(state, session_id).await?;
    let mut session = session.lock().await;
    session.handle(event).await;
    Ok(Json(StateResponse::from_state(session.state().project())))
}

async fn api_state(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SessionQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let session = find_session(&state, &q.session_id).await?;
    let session = session.lock().await;
    Ok(Json(StateResponse::from_state(session.state().project())))
}

async fn api_init(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let credential = req
        .credential
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.server_credential.clone());
    let panel = ConfigPanel::new(req.kind, req.temperature, credential);
    let config = panel
        .submit()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    drive(&state, &req.session_id, SessionEvent::Initialize(config)).await
}

async fn api_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    drive(
        &state,
        &req.session_id,
        SessionEvent::SettingsObserved {
            kind: req.kind,
            temperature: req.temperature,
        },
    )
    .await
}

async fn api_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }
    drive(&state, &req.session_id, SessionEvent::UserMessage(message.to_string())).await
}

async fn api_clear(
    State(state): State<Arc<AppState>>,
    Json(q): Json<SessionQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    drive(&state, &q.session_id, SessionEvent::Clear).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(server_credential: &str) -> Arc<AppState> {
        Arc::new(AppState {
            config: AppConfig::default(),
            factory: Arc::new(LlmAgentFactory::new("mock", "gpt-4")),
            server_credential: server_credential.to_string(),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (_, body) = call(app, "POST", "/api/session", None).await;
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_init_and_chat() {
        let app = router(test_state(""));
        let sid = new_session(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/init",
            Some(json!({"session_id": sid, "kind": "Market_Analyst", "temperature": 0.5, "credential": "sk-x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["phase"], "Ready");

        let (status, body) = call(
            &app,
            "POST",
            "/api/chat",
            Some(json!({"session_id": sid, "message": "What is the outlook for bonds?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["speaker"], "user");
        assert_eq!(rows[1]["speaker"], "assistant");
    }

    #[tokio::test]
    async fn test_init_without_credential_is_rejected() {
        let app = router(test_state(""));
        let sid = new_session(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/init",
            Some(json!({"session_id": sid, "kind": "Data_Analyst", "temperature": 0.7})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", &format!("/api/state?session_id={}", sid), None).await;
        assert_eq!(body["state"]["phase"], "Uninitialized");
    }

    #[tokio::test]
    async fn test_server_credential_used_when_blank() {
        let app = router(test_state("sk-server"));
        let sid = new_session(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/init",
            Some(json!({"session_id": sid, "kind": "Data_Analyst", "temperature": 0.7, "credential": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["agent"], "Data_Analyst");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let app = router(test_state("sk-server"));
        let a = new_session(&app).await;
        let b = new_session(&app).await;

        call(
            &app,
            "POST",
            "/api/init",
            Some(json!({"session_id": a, "kind": "Market_Analyst", "temperature": 0.5})),
        )
        .await;
        call(&app, "POST", "/api/chat", Some(json!({"session_id": a, "message": "hi"}))).await;

        let (_, body) = call(&app, "GET", &format!("/api/state?session_id={}", b), None).await;
        assert_eq!(body["rows"].as_array().unwrap().len(), 0);
        assert_eq!(body["state"]["phase"], "Uninitialized");
    }

    #[tokio::test]
    async fn test_closed_session_is_removed() {
        let state = test_state("sk-server");
        let app = router(state.clone());
        let sid = new_session(&app).await;
        let other = new_session(&app).await;
        assert_eq!(state.sessions.read().await.len(), 2);

        let (status, _) = call(&app, "POST", "/api/session/close", Some(json!({"session_id": sid}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.sessions.read().await.len(), 1);

        let (status, _) = call(&app, "GET", &format!("/api/state?session_id={}", sid), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "GET", &format!("/api/state?session_id={}", other), None).await;
        assert_eq!(status, StatusCode::OK);

        // 重复关闭不报错
        let (status, _) = call(&app, "POST", "/api/session/close", Some(json!({"session_id": sid}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = router(test_state(""));
        let (status, _) = call(&app, "GET", "/api/state?session_id=nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
