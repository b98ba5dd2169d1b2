//! TUI 层：Ratatui + crossterm，主循环（app）、事件（event）、设置面板（panel）、渲染（render）

pub mod app;
pub mod event;
pub mod panel;
pub mod render;

pub use app::{run_app, Titles};
pub use event::EventHandler;
pub use panel::ConfigPanel;
pub use render::{draw, transcript_rows, Row, Speaker, TranscriptEntry};
