use crate::notify::{NoticeKind, NoticeLog, SharedTheme};
use crate::store::{BoardStore, BoardView};
use crate::task::{NewTask, Priority, TaskUpdate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

const HELP: &str = "a add  e edit  d delete  enter/bksp move  t theme  q quit";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub column: usize,
    pub task: usize,
}

impl Selection {
    /// Keep the cursor inside the board after tasks come and go.
    fn clamp(&mut self, view: &BoardView) {
        self.column = self.column.min(view.columns.len().saturating_sub(1));
        let len = view
            .columns
            .get(self.column)
            .map(|c| c.tasks.len())
            .unwrap_or(0);
        self.task = self.task.min(len.saturating_sub(1));
    }
}

struct Palette {
    base: Style,
    accent: Color,
}

impl Palette {
    fn for_mode(dark: bool) -> Self {
        if dark {
            Self {
                base: Style::default().fg(Color::White).bg(Color::Black),
                accent: Color::Cyan,
            }
        } else {
            Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
            }
        }
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

pub struct App {
    store: Arc<BoardStore>,
    theme: SharedTheme,
    notices: Arc<NoticeLog>,
    selection: Selection,
}

impl App {
    pub fn new(store: Arc<BoardStore>, theme: SharedTheme, notices: Arc<NoticeLog>) -> Self {
        Self {
            store,
            theme,
            notices,
            selection: Selection::default(),
        }
    }
}

pub fn draw(f: &mut Frame, view: &BoardView, selection: Selection, dark: bool, status: &Line) {
    let palette = Palette::for_mode(dark);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[0]);

    for (i, column) in view.columns.iter().enumerate().take(chunks.len()) {
        let items: Vec<ListItem> = column
            .tasks
            .iter()
            .enumerate()
            .map(|(j, t)| {
                let mut style = palette.base;
                if selection.column == i && selection.task == j {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let mut spans = vec![
                    Span::styled(format!("[{}] ", t.priority), Style::default().fg(priority_color(t.priority))),
                    Span::styled(t.title.clone(), style),
                ];
                if t.voice_transcript.is_some() {
                    spans.push(Span::raw(" (voz)"));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .style(palette.base)
            .block(
                Block::default()
                    .title(format!("{} ({})", column.title, column.tasks.len()))
                    .borders(Borders::ALL)
                    .border_style(if selection.column == i {
                        Style::default().fg(palette.accent)
                    } else {
                        palette.base
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD));

        f.render_widget(list, chunks[i]);
    }

    f.render_widget(Paragraph::new(status.clone()).style(palette.base), rows[1]);
}

fn status_line(view: &BoardView, notices: &NoticeLog) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("{}% done  ", view.progress))];
    if let Some(error) = &view.error {
        spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
    } else if let Some(notice) = notices.latest() {
        let color = match notice.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        spans.push(Span::styled(notice.message, Style::default().fg(color)));
    }
    spans.push(Span::raw(format!("  |  {}", HELP)));
    Line::from(spans)
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, runtime: &Runtime) -> io::Result<()> {
    loop {
        let view = runtime.block_on(app.store.view());
        app.selection.clamp(&view);
        let status = status_line(&view, &app.notices);
        let selection = app.selection;
        let dark = app.theme.is_dark();
        terminal.draw(|f| draw(f, &view, selection, dark, &status))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let column_count = view.columns.len();
        let current_column = view.columns.get(selection.column);
        let current_task = current_column.and_then(|c| c.tasks.get(selection.task));

        // Failures are recorded on the store and shown in the status line.
        let outcome = match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('a') => {
                let Some(title) = prompt("Task title").filter(|t| !t.is_empty()) else {
                    continue;
                };
                let description = prompt("Description").unwrap_or_default();
                let priority = prompt("Priority (low/medium/high)")
                    .and_then(|p| p.parse::<Priority>().ok())
                    .unwrap_or_default();
                let mut data = NewTask::new(title)
                    .with_description(description)
                    .with_priority(priority);
                if let Some(column) = current_column {
                    data = data.in_column(column.id.clone());
                }
                runtime.block_on(app.store.add_task(data)).map(|_| ())
            }
            KeyCode::Char('e') => match current_task {
                Some(task) => match prompt("New title").filter(|t| !t.is_empty()) {
                    Some(title) => runtime
                        .block_on(app.store.update_task(&task.id, TaskUpdate::default().title(title)))
                        .map(|_| ()),
                    None => Ok(()),
                },
                None => Ok(()),
            },
            KeyCode::Char('d') => match current_task {
                Some(task) => runtime.block_on(app.store.delete_task(&task.id)),
                None => Ok(()),
            },
            KeyCode::Char('t') => runtime.block_on(app.store.toggle_dark_mode()).map(|_| ()),
            KeyCode::Enter | KeyCode::Backspace => {
                let target = if key.code == KeyCode::Enter {
                    selection.column + 1
                } else {
                    selection.column.wrapping_sub(1)
                };
                match (current_column, current_task, view.columns.get(target)) {
                    (Some(from), Some(task), Some(to)) => {
                        let moved = runtime.block_on(app.store.move_task(&task.id, &from.id, &to.id));
                        if moved.is_ok() {
                            app.selection = Selection {
                                column: target,
                                task: to.tasks.len(),
                            };
                        }
                        moved.map(|_| ())
                    }
                    _ => Ok(()),
                }
            }
            KeyCode::Left => {
                app.selection.column = app.selection.column.saturating_sub(1);
                app.selection.task = 0;
                Ok(())
            }
            KeyCode::Right => {
                if app.selection.column + 1 < column_count {
                    app.selection.column += 1;
                    app.selection.task = 0;
                }
                Ok(())
            }
            KeyCode::Up => {
                app.selection.task = app.selection.task.saturating_sub(1);
                Ok(())
            }
            KeyCode::Down => {
                app.selection.task += 1;
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = outcome {
            tracing::debug!("key {:?} failed: {}", key.code, e);
        }
    }
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input);
    enable_raw_mode().ok();
    read.ok().map(|_| input.trim().to_string())
}
