use crate::app::{ActiveInput, App, InputMode, Tab};
use crate::models::{ListColor, Priority, Task};
use crate::notify::Notification;
use crossterm::event::{self, Event as CEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn list_color(color: ListColor) -> Color {
    match color {
        ListColor::Blue => Color::Blue,
        ListColor::Green => Color::Green,
        ListColor::Yellow => Color::Yellow,
        ListColor::Magenta => Color::Magenta,
        ListColor::Cyan => Color::Cyan,
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().bg(Color::Red).fg(Color::Black),
        Priority::Medium => Style::default().bg(Color::Yellow).fg(Color::Black),
        Priority::Low => Style::default().bg(Color::DarkGray).fg(Color::White),
    }
}

fn task_line(task: &Task) -> Line<'static> {
    let mut spans = vec![
        Span::raw(if task.completed { "[x] " } else { "[ ] " }),
        Span::styled(
            task.title.clone(),
            if task.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            },
        ),
        Span::raw(" "),
        Span::styled(format!(" {} ", task.priority.label()), priority_style(task.priority)),
    ];

    if let Some(date) = task.due_date {
        let mut due = format!(" due {}", date.format("%Y-%m-%d"));
        if let Some(time) = task.due_time {
            due.push_str(&format!(" {}", time.format("%H:%M")));
        }
        spans.push(Span::styled(due, Style::default().fg(Color::DarkGray)));
    }

    Line::from(spans)
}

fn get_legend(input_mode: &InputMode) -> Text<'static> {
    match input_mode {
        InputMode::Normal => Text::from(Line::from(vec![
            Span::styled(" q ", Style::default().fg(Color::Red)),
            Span::raw(": Quit "),
            Span::styled(" j/k ", Style::default().fg(Color::Red)),
            Span::raw(": Move "),
            Span::styled(" n/p ", Style::default().fg(Color::Red)),
            Span::raw(": Switch List "),
            Span::styled(" t ", Style::default().fg(Color::Red)),
            Span::raw(": Pending/Completed "),
            Span::styled(" x ", Style::default().fg(Color::Red)),
            Span::raw(": Toggle "),
            Span::styled(" d ", Style::default().fg(Color::Red)),
            Span::raw(": Delete "),
            Span::styled(" a ", Style::default().fg(Color::Red)),
            Span::raw(": Add Task "),
            Span::styled(" c ", Style::default().fg(Color::Red)),
            Span::raw(": New List "),
            Span::styled(" m ", Style::default().fg(Color::Red)),
            Span::raw(": Mark for Merge "),
            Span::styled(" M ", Style::default().fg(Color::Red)),
            Span::raw(": Merge Marked "),
        ])),
        InputMode::EditingTask | InputMode::EditingList => Text::from(Line::from(vec![
            Span::styled(" i ", Style::default().fg(Color::Red)),
            Span::raw(": Insert "),
            Span::styled(" Tab ", Style::default().fg(Color::Red)),
            Span::raw(": Next Field "),
            Span::styled(" Enter ", Style::default().fg(Color::Red)),
            Span::raw(": Submit "),
            Span::styled(" Esc ", Style::default().fg(Color::Red)),
            Span::raw(": Cancel "),
        ])),
        InputMode::Insert => Text::from(Line::from(vec![
            Span::styled(" Esc ", Style::default().fg(Color::Red)),
            Span::raw(": Stop Editing "),
        ])),
    }
}

fn form_field(label: &str, value: &str, active: bool) -> Line<'static> {
    let label_style = if active {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let marker = if active { "> " } else { "  " };
    Line::from(vec![
        Span::raw(marker.to_string()),
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value.to_string()),
    ])
}

fn draw_task_form(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_absolute(60, 9, area);

    let popup_block = Block::default()
        .title("New Task (Enter to Submit)")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let mut lines = vec![
        form_field(
            "Title",
            &app.new_task_title,
            app.active_input == ActiveInput::Title,
        ),
        form_field(
            "Description",
            &app.new_task_description,
            app.active_input == ActiveInput::Description,
        ),
        form_field(
            "Due date (YYYY-MM-DD)",
            &app.new_task_due_date,
            app.active_input == ActiveInput::DueDate,
        ),
        form_field(
            "Due time (HH:MM)",
            &app.new_task_due_time,
            app.active_input == ActiveInput::DueTime,
        ),
        Line::from(Span::styled(
            "  Priority via !low / !med / !high in the title",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(ref msg) = app.form_error {
        lines.push(Line::from(Span::styled(
            format!("  {msg}"),
            Style::default().fg(Color::Red),
        )));
    }

    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(popup_block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_list_form(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_absolute(50, 3, area);

    let popup_block = Block::default()
        .title("New List (Enter to Submit)")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let input = Paragraph::new(app.new_list_name.as_str())
        .style(Style::default().fg(Color::White))
        .block(popup_block);

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_toast(f: &mut ratatui::Frame, toast: &Notification, area: Rect) {
    let width = (toast.title.chars().count().max(toast.body.chars().count()) as u16 + 4)
        .min(area.width.saturating_sub(2));
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 4.min(area.height),
    };

    let block = Block::default()
        .title("Reminder (Esc to dismiss)")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));

    let body = Paragraph::new(vec![
        Line::from(Span::styled(
            toast.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(toast.body.clone())),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(body, popup_area);
}

pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut toasts: mpsc::UnboundedReceiver<Notification>,
) -> io::Result<()> {
    loop {
        // Reminders queued by the scanner since the last frame.
        while let Ok(notification) = toasts.try_recv() {
            app.push_toast(notification);
        }

        terminal.draw(|f| {
            let size = f.area();

            // Split the main layout into body and footer
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(0)
                .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
                .split(size);

            let body_chunk = chunks[0];
            let footer_chunk = chunks[1];

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
                .split(body_chunk);

            // Left panel: task lists with counts and merge marks
            let list_items: Vec<ListItem> = app
                .store
                .lists()
                .iter()
                .map(|list| {
                    let selected = list.id == app.store.selected_list_id();
                    let mut spans = vec![
                        Span::raw(if app.store.is_marked_for_merge(list.id) {
                            "[*] "
                        } else {
                            "[ ] "
                        }),
                        Span::styled("● ", Style::default().fg(list_color(list.color))),
                        Span::styled(
                            list.name.clone(),
                            if selected {
                                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                            } else {
                                Style::default()
                            },
                        ),
                    ];
                    spans.push(Span::styled(
                        format!(" ({})", list.tasks.len()),
                        Style::default().fg(Color::DarkGray),
                    ));
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let lists_widget = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title("Lists"));
            f.render_widget(lists_widget, body[0]);

            // Right panel: tasks of the selected list on the active tab
            let (pending, completed) = match app.store.selected_list() {
                Some(list) => (list.pending().count(), list.completed().count()),
                None => (0, 0),
            };
            let title = match app.tab {
                Tab::Pending => format!("Pending ({pending}) | completed: {completed}"),
                Tab::Completed => format!("Completed ({completed}) | pending: {pending}"),
            };

            let visible = app.visible_tasks();
            let tasks_widget = if !visible.is_empty() {
                let rows: Vec<ListItem> = visible
                    .iter()
                    .map(|task| ListItem::new(task_line(task)))
                    .collect();

                List::new(rows)
                    .block(Block::default().borders(Borders::ALL).title(title))
                    .highlight_style(
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                    .highlight_symbol(">> ")
            } else {
                let empty = match app.tab {
                    Tab::Pending => "No pending tasks",
                    Tab::Completed => "No completed tasks",
                };
                List::new(vec![ListItem::new(empty)])
                    .block(Block::default().borders(Borders::ALL).title(title))
            };
            f.render_stateful_widget(tasks_widget, body[1], &mut app.state);

            match app.input_mode {
                InputMode::Normal => {}
                InputMode::EditingTask => draw_task_form(f, &app, body_chunk),
                InputMode::EditingList => draw_list_form(f, &app, body_chunk),
                InputMode::Insert => {
                    if app.active_input == ActiveInput::ListName {
                        draw_list_form(f, &app, body_chunk);
                    } else {
                        draw_task_form(f, &app, body_chunk);
                    }
                }
            }

            if let Some(ref toast) = app.toast {
                draw_toast(f, toast, body_chunk);
            }

            // Render the legend in the footer
            let legend = Paragraph::new(get_legend(&app.input_mode))
                .style(Style::default().fg(Color::White))
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: true });

            f.render_widget(legend, footer_chunk);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}
