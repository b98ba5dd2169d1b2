//! 界面渲染
//!
//! `transcript_rows` 是纯函数：Transcript → 有序的气泡列表；格式不对的条目变成一行可见警告，后续条目照常渲染。
//! `draw` 用 ratatui 绘制一帧：左侧设置栏，右侧标题、对话区（按角色着色、按宽度换行）、输入框与页脚。

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use serde::Serialize;

use crate::agent::AgentKind;
use crate::core::{Notice, SessionPhase, UiState};
use crate::memory::Message;
use crate::ui::panel::ConfigPanel;

/// 可渲染的 Transcript 条目：角色与内容都可能缺失或不合法
pub trait TranscriptEntry {
    fn role(&self) -> Option<&str>;
    fn content(&self) -> Option<&str>;
}

impl TranscriptEntry for Message {
    fn role(&self) -> Option<&str> {
        Some(self.role.as_str())
    }

    fn content(&self) -> Option<&str> {
        Some(&self.content)
    }
}

impl TranscriptEntry for serde_json::Value {
    fn role(&self) -> Option<&str> {
        self.get("role").and_then(serde_json::Value::as_str)
    }

    fn content(&self) -> Option<&str> {
        self.get("content").and_then(serde_json::Value::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// 渲染结果中的一行
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Row {
    Bubble { speaker: Speaker, content: String },
    Warning { text: String },
}

/// Transcript → 气泡列表
pub fn transcript_rows<'a, E, I>(entries: I) -> Vec<Row>
where
    E: TranscriptEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let speaker = match entry.role() {
                Some("user") => Speaker::User,
                Some("assistant") => Speaker::Assistant,
                Some(other) => {
                    return Row::Warning {
                        text: format!("Skipped message #{}: unknown role '{}'", idx + 1, other),
                    }
                }
                None => {
                    return Row::Warning {
                        text: format!("Skipped message #{}: missing role", idx + 1),
                    }
                }
            };
            match entry.content() {
                Some(content) => Row::Bubble {
                    speaker,
                    content: content.to_string(),
                },
                None => Row::Warning {
                    text: format!("Skipped message #{}: content is not text", idx + 1),
                },
            }
        })
        .collect()
}

/// 将内容按宽度换行，支持 UTF-8（按字符数，避免在 UTF-8 中间截断）
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        lines.push(line);
    }
    lines
}

/// 当前获得焦点的控件
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    Kind,
    Temperature,
    Credential,
    Initialize,
    #[default]
    Input,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Kind => Focus::Temperature,
            Focus::Temperature => Focus::Credential,
            Focus::Credential => Focus::Initialize,
            Focus::Initialize => Focus::Input,
            Focus::Input => Focus::Kind,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Kind => Focus::Input,
            Focus::Temperature => Focus::Kind,
            Focus::Credential => Focus::Temperature,
            Focus::Initialize => Focus::Credential,
            Focus::Input => Focus::Initialize,
        }
    }
}

/// 一帧所需的全部输入
pub struct View<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub state: &'a UiState,
    pub panel: &'a ConfigPanel,
    /// 面板本地的提示（如缺少凭据），优先于会话提示显示
    pub local_notice: Option<&'a Notice>,
    pub input: &'a str,
    pub focus: Focus,
    pub scroll: usize,
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, view: &View) {
    let outer = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(AgentKind::ALL.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(inner);

    let items: Vec<ListItem> = AgentKind::ALL
        .iter()
        .map(|k| ListItem::new(k.as_str()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Select your financial agent ")
                .borders(Borders::ALL)
                .border_style(focus_style(view.focus == Focus::Kind)),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(view.panel.kind_index()));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    let t = view.panel.temperature();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Response Creativity ")
                .borders(Borders::ALL)
                .border_style(focus_style(view.focus == Focus::Temperature)),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(f64::from(t))
        .label(format!("{:.1}", t));
    f.render_widget(gauge, chunks[1]);

    let credential = Paragraph::new(view.panel.masked_credential()).block(
        Block::default()
            .title(" API Key ")
            .borders(Borders::ALL)
            .border_style(focus_style(view.focus == Focus::Credential)),
    );
    f.render_widget(credential, chunks[2]);

    let button_style = if view.focus == Focus::Initialize {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(Span::styled(" Initialize Agent ", button_style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(button, chunks[3]);

    let notice = view.local_notice.or(view.state.notice.as_ref());
    if let Some(notice) = notice {
        let color = match notice {
            Notice::Success(_) => Color::Green,
            Notice::Warning(_) => Color::Yellow,
            Notice::Error(_) => Color::Red,
        };
        let p = Paragraph::new(notice.text())
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false });
        f.render_widget(p, chunks[4]);
    }
}

/// 绘制一帧；将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(f: &mut Frame, view: &View, out: &mut (usize, usize)) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(30)])
        .split(f.area());
    draw_sidebar(f, columns[0], view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    let header = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            view.title,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(view.subtitle, Style::default().fg(Color::Gray))),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let conv_area = chunks[1];
    let content_width = conv_area.width.saturating_sub(3) as usize; // 边框 + 滚动条

    let agent_label = view
        .state
        .agent
        .map(|k| k.as_str().to_string())
        .unwrap_or_else(|| "not initialized".to_string());
    let block = Block::default()
        .title(format!(" {} ", agent_label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    // 对话内容：用户消息靠右、助手消息靠左，消息之间加空行
    let mut text_lines: Vec<Line> = Vec::new();
    for (idx, row) in transcript_rows(&view.state.history).into_iter().enumerate() {
        if idx > 0 {
            text_lines.push(Line::from(""));
        }
        match row {
            Row::Bubble { speaker, content } => {
                let (label, color, alignment) = match speaker {
                    Speaker::User => ("You", Color::Cyan, Alignment::Right),
                    Speaker::Assistant => ("FinRobot", Color::Green, Alignment::Left),
                };
                text_lines.push(
                    Line::from(Span::styled(
                        label,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(alignment),
                );
                for line in wrap_text(&content, content_width.max(20) * 3 / 4) {
                    text_lines.push(Line::from(line).style(Style::default().fg(color)).alignment(alignment));
                }
            }
            Row::Warning { text } => {
                text_lines.push(Line::from(Span::styled(
                    format!("⚠ {}", text),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let max_scroll = total_lines.saturating_sub(content_height);
    let scroll_offset = view.scroll.min(max_scroll);

    let paragraph = Paragraph::new(Text::from(text_lines))
        .block(block)
        .scroll((scroll_offset as u16, 0));
    f.render_widget(paragraph, conv_area);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, conv_area, &mut scrollbar_state);
    }

    let input_title = match view.state.phase {
        SessionPhase::Generating => " FinRobot is thinking... ".to_string(),
        SessionPhase::Initializing => " Initializing agent... ".to_string(),
        _ => " Ask your financial question ".to_string(),
    };
    let hint = " Enter 发送 │ Tab 切换焦点 │ ↑↓ 调整/滚动 │ Ctrl+L 清空 │ Ctrl+Q 退出 ";
    let input_block = Block::default()
        .title(input_title)
        .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
        .borders(Borders::ALL)
        .border_style(focus_style(view.focus == Focus::Input));
    let input = Paragraph::new(view.input)
        .block(input_block)
        .wrap(Wrap { trim: false })
        .style(if view.state.busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });
    f.render_widget(input, chunks[2]);

    let footer = Paragraph::new(format!(
        "Built with FinBee | Current Date: {}",
        chrono::Local::now().format("%Y-%m-%d")
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);

    out.0 = total_lines;
    out.1 = content_height;
}
