// tui.rs

use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use log::warn;
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use recall::app::{App, InputMode, NoticeLevel};
use recall::markup::{Segment, segments};
use recall::{ArchivedTodo, ListKind, NewArchivedTodo, NewTodo, RemoteCollection, Todo};
use std::{io, time::Duration};

pub fn run_app<B, A, D>(terminal: &mut Terminal<B>, app: &mut App<A, D>) -> io::Result<()>
where
    B: Backend,
    std::io::Error: From<<B as Backend>::Error>,
    A: RemoteCollection<Record = Todo, Draft = NewTodo>,
    D: RemoteCollection<Record = ArchivedTodo, Draft = NewArchivedTodo>,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !crossterm::event::poll(Duration::from_millis(250))? {
            continue;
        }
        let CEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') => app.open_dialog(),
                KeyCode::Char('d') => app.complete_selected(),
                // Delete selected item (Shift+R only)
                KeyCode::Char('r') | KeyCode::Char('R')
                    if key.modifiers.contains(KeyModifiers::SHIFT) =>
                {
                    app.delete_selected(|prompt: &str| match confirm_modal(terminal, prompt) {
                        Ok(yes) => yes,
                        Err(e) => {
                            warn!("confirmation prompt failed: {}", e);
                            false
                        }
                    });
                }
                KeyCode::Char('r') => app.refresh(),
                KeyCode::Char('?') => app.start_search(),
                KeyCode::Tab | KeyCode::Left | KeyCode::Right => app.toggle_focus(),
                KeyCode::Down => app.select_next(),
                KeyCode::Up => app.select_prev(),
                _ => {}
            },
            InputMode::EditingAnswer | InputMode::EditingQuestionNumber => match key.code {
                KeyCode::Enter => {
                    app.submit_new_todo();
                }
                KeyCode::Esc => app.cancel_dialog(),
                KeyCode::Tab => app.next_dialog_field(),
                KeyCode::Char(c) => dialog_field(app).push(c),
                KeyCode::Backspace => {
                    dialog_field(app).pop();
                }
                _ => {}
            },
            InputMode::Searching => match key.code {
                KeyCode::Enter => app.finish_search(true),
                KeyCode::Esc => app.finish_search(false),
                KeyCode::Char(c) => {
                    app.focused_query_mut().push(c);
                    app.clamp_selection();
                }
                KeyCode::Backspace => {
                    app.focused_query_mut().pop();
                    app.clamp_selection();
                }
                _ => {}
            },
        }
    }
}

fn dialog_field<A, D>(app: &mut App<A, D>) -> &mut String {
    match app.input_mode {
        InputMode::EditingQuestionNumber => &mut app.input_question_number,
        _ => &mut app.input_answer,
    }
}

/// Blocks until the user answers y/n. Esc counts as no.
fn confirm_modal<B: Backend>(terminal: &mut Terminal<B>, prompt: &str) -> io::Result<bool>
where
    std::io::Error: From<<B as Backend>::Error>,
{
    loop {
        terminal.draw(|f| {
            let area = centered(f.area(), 40, 5);
            let body = Paragraph::new(vec![
                Line::from(Span::styled(
                    prompt.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from("[y] yes   [n] no"),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Confirm "));
            f.render_widget(Clear, area);
            f.render_widget(body, area);
        })?;

        if let CEvent::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn emphasis_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// One display line per line of the answer, emphasized spans highlighted.
fn answer_lines(answer: &str, base: Style) -> Vec<Line<'_>> {
    answer
        .lines()
        .map(|line| {
            let spans: Vec<Span> = segments(line)
                .filter(|s| !s.text().is_empty())
                .map(|s| match s {
                    Segment::Plain(t) => Span::styled(t, base),
                    Segment::Emphasized(t) => Span::styled(t, emphasis_style()),
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn todo_item<'a>(
    marker: &str,
    number: &'a str,
    question: Option<&'a str>,
    answer: &'a str,
    base: Style,
) -> ListItem<'a> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{}{} ", marker, number),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(question.unwrap_or(""), base.add_modifier(Modifier::BOLD)),
    ])];
    lines.push(Line::from(Span::styled("─".repeat(24), Style::default().fg(Color::Cyan))));
    lines.extend(answer_lines(answer, base));
    lines.push(Line::from(""));
    ListItem::new(Text::from(lines))
}

fn list_block(title: &str, query: &str, focused: bool) -> Block<'static> {
    let title = if query.is_empty() {
        format!(" {} ", title)
    } else {
        format!(" {} [?{}] ", title, query)
    };
    let style = if focused {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(title, style))
}

fn ui<A, D>(f: &mut ratatui::Frame<'_>, app: &App<A, D>)
where
    A: RemoteCollection<Record = Todo, Draft = NewTodo>,
    D: RemoteCollection<Record = ArchivedTodo, Draft = NewArchivedTodo>,
{
    let searching = app.input_mode == InputMode::Searching;
    let mut constraints = vec![
        Constraint::Length(1), // title
        Constraint::Min(3),    // lists
        Constraint::Length(1), // status
        Constraint::Length(1), // help
    ];
    if searching {
        constraints.insert(2, Constraint::Length(3));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        format!(
            "Recall · {} open · {} done",
            app.mirrors.todos.len(),
            app.mirrors.done_todos.len()
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let highlight = Style::default().bg(Color::DarkGray);

    let active_items: Vec<ListItem> = app
        .visible_active()
        .into_iter()
        .map(|t| {
            let base = Style::default().fg(Color::Gray);
            todo_item(":", &t.question_number, t.question.as_deref(), &t.answer, base)
        })
        .collect();
    let active_list = List::new(active_items)
        .block(list_block("Today", &app.active_query, app.focus == ListKind::Active))
        .highlight_style(highlight)
        .highlight_symbol(">> ");
    let mut active_state = ListState::default();
    if app.focus == ListKind::Active {
        active_state.select(Some(app.selected_active));
    }
    f.render_stateful_widget(active_list, cols[0], &mut active_state);

    let done_items: Vec<ListItem> = app
        .visible_archived()
        .into_iter()
        .map(|t| {
            let base = Style::default().fg(Color::DarkGray);
            todo_item("#", &t.question_number, t.question.as_deref(), &t.answer, base)
        })
        .collect();
    let done_list = List::new(done_items)
        .block(list_block("Previous", &app.archived_query, app.focus == ListKind::Archived))
        .highlight_style(highlight)
        .highlight_symbol(">> ");
    let mut done_state = ListState::default();
    if app.focus == ListKind::Archived {
        done_state.select(Some(app.selected_archived));
    }
    f.render_stateful_widget(done_list, cols[1], &mut done_state);

    let mut next = 2;
    if searching {
        let query = match app.focus {
            ListKind::Active => &app.active_query,
            ListKind::Archived => &app.archived_query,
        };
        let input = Paragraph::new(query.as_str())
            .block(Block::default().borders(Borders::ALL).title(" Search (Enter keep, Esc clear) "));
        f.render_widget(input, chunks[next]);
        next += 1;
    }

    let status = match app.latest_notice() {
        Some(n) => {
            let color = match n.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!("[{}] {}", n.at.format("%H:%M:%S"), n.text),
                Style::default().fg(color),
            ))
        }
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(status), chunks[next]);

    let b = Style::default().add_modifier(Modifier::BOLD);
    let help = Paragraph::new(Line::from(vec![
        Span::styled("a", b), Span::raw(" add, "),
        Span::styled("d", b), Span::raw(" done, "),
        Span::raw("Shift+"), Span::styled("R", b), Span::raw(" delete, "),
        Span::styled("?", b), Span::raw(" search, "),
        Span::styled("Tab", b), Span::raw(" switch list, "),
        Span::styled("r", b), Span::raw(" refresh, "),
        Span::styled("q", b), Span::raw(" quit"),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[next + 1]);

    if app.dialog_open {
        render_dialog(f, app);
    }
}

fn render_dialog<A, D>(f: &mut ratatui::Frame<'_>, app: &App<A, D>) {
    let area = centered(f.area(), 60, 12);
    f.render_widget(Clear, area);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" Add a new plan (Tab switch, Enter save, Esc cancel) ");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(inner);

    let active = Style::default().fg(Color::Magenta);
    let field = |title: &'static str, editing: bool| {
        let block = Block::default().borders(Borders::ALL).title(title);
        if editing { block.border_style(active) } else { block }
    };

    let answer = Paragraph::new(app.input_answer.as_str())
        .wrap(Wrap { trim: false })
        .block(field(" Answer ", app.input_mode == InputMode::EditingAnswer));
    f.render_widget(answer, rows[0]);

    let number = Paragraph::new(app.input_question_number.as_str())
        .block(field(" Number ", app.input_mode == InputMode::EditingQuestionNumber));
    f.render_widget(number, rows[1]);
}
