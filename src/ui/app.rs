//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件：按焦点把按键交给设置面板或输入框，
//! 把 Initialize / 设置变化 / 提交转为 Command 发送给编排器，每帧用 draw 渲染 UiState。

use std::io::{self, Stdout};

use crossterm::event::KeyCode;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, Notice, UiState};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::panel::ConfigPanel;
use crate::ui::render::{draw, Focus, View};

/// 页面标题
pub struct Titles {
    pub title: String,
    pub subtitle: String,
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    mut panel: ConfigPanel,
    titles: Titles,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(cmd_tx);
    let mut input_buffer = String::new();
    let mut focus = Focus::Kind;
    let mut local_notice: Option<Notice> = None;
    let mut conversation_scroll = 0usize;
    let mut last_history_len = 0usize;
    let mut last_settings = panel.settings();

    loop {
        let state = state_rx.borrow().clone();

        if state.history.len() != last_history_len {
            last_history_len = state.history.len();
            conversation_scroll = usize::MAX;
        }

        if let Ok(Some(ev)) = event_handler.poll() {
            match ev {
                AppEvent::Command(Command::Quit) => break,
                AppEvent::Command(_) => {}
                AppEvent::Key(key) => match key.code {
                    KeyCode::Tab => focus = focus.next(),
                    KeyCode::BackTab => focus = focus.prev(),
                    code => match focus {
                        Focus::Kind => match code {
                            KeyCode::Up => panel.select_prev(),
                            KeyCode::Down => panel.select_next(),
                            _ => {}
                        },
                        Focus::Temperature => match code {
                            KeyCode::Up | KeyCode::Right => panel.temperature_up(),
                            KeyCode::Down | KeyCode::Left => panel.temperature_down(),
                            _ => {}
                        },
                        Focus::Credential => match code {
                            KeyCode::Char(c) => panel.push_credential_char(c),
                            KeyCode::Backspace => panel.pop_credential_char(),
                            KeyCode::Enter => focus = Focus::Initialize,
                            _ => {}
                        },
                        Focus::Initialize => {
                            if code == KeyCode::Enter {
                                match panel.submit() {
                                    Ok(config) => {
                                        local_notice = None;
                                        last_settings = panel.settings();
                                        event_handler.send_initialize(config);
                                        focus = Focus::Input;
                                    }
                                    Err(e) => local_notice = Some(Notice::Warning(e.to_string())),
                                }
                            }
                        }
                        Focus::Input if !state.busy => match code {
                            KeyCode::Enter => {
                                let input = input_buffer.trim().to_string();
                                input_buffer.clear();
                                if !input.is_empty() {
                                    if matches!(input.to_lowercase().as_str(), "/exit" | "/quit") {
                                        break;
                                    }
                                    local_notice = None;
                                    event_handler.send_submit(input);
                                }
                            }
                            KeyCode::Backspace => {
                                input_buffer.pop();
                            }
                            KeyCode::Char(c) => input_buffer.push(c),
                            KeyCode::Up => {
                                conversation_scroll = conversation_scroll.saturating_sub(1)
                            }
                            KeyCode::Down => {
                                conversation_scroll = conversation_scroll.saturating_add(1)
                            }
                            KeyCode::PageUp => {
                                conversation_scroll = conversation_scroll.saturating_sub(10)
                            }
                            KeyCode::PageDown => {
                                conversation_scroll = conversation_scroll.saturating_add(10)
                            }
                            KeyCode::Home => conversation_scroll = 0,
                            KeyCode::End => conversation_scroll = usize::MAX,
                            _ => {}
                        },
                        Focus::Input => {}
                    },
                },
            }
        }

        // 每帧检查一次设置；变化交给会话决定是否重新初始化
        let settings = panel.settings();
        if settings != last_settings {
            last_settings = settings;
            event_handler.send_settings(settings.0, settings.1);
        }

        let view = View {
            title: &titles.title,
            subtitle: &titles.subtitle,
            state: &state,
            panel: &panel,
            local_notice: local_notice.as_ref(),
            input: &input_buffer,
            focus,
            scroll: conversation_scroll,
        };
        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| draw(f, &view, &mut scroll_info))?;
        let (total_lines, viewport_height) = scroll_info;
        conversation_scroll = conversation_scroll.min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
