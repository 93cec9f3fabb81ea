use crate::models::{CourseBody, CourseReport, GradeGrid, Mark, RubricPresence, RubricSummaryLine};
use crate::ui::state::{AppState, FetchProgress, ResultsView};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

const TITLE: &str = "Canvas Grade Auditor";

const GREEN: Color = Color::Rgb(0x27, 0xae, 0x60);
const RED: Color = Color::Rgb(0xcb, 0x48, 0x21);
const YELLOW: Color = Color::Rgb(0xd5, 0xd3, 0x32);

/// Rows kept for the grade table (borders, header and a few students).
const GRID_MIN_HEIGHT: u16 = 8;

pub fn render_ui(frame: &mut Frame, state: &AppState) {
    match state {
        AppState::Input { input, message } => render_input(frame, input, message.as_deref()),
        AppState::Running { progress } => render_running(frame, progress),
        AppState::Results(view) => render_results(frame, view),
        AppState::Error { message } => render_error(frame, message),
    }
}

pub fn mark_style(mark: Mark) -> Style {
    match mark {
        Mark::Yes => Style::default().bg(GREEN).fg(Color::White),
        Mark::No => Style::default().bg(RED).fg(Color::White),
        Mark::NoGrade => Style::default().bg(YELLOW).fg(Color::Black),
    }
}

fn render_input(frame: &mut Frame, input: &str, message: Option<&str>) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    let title = Paragraph::new("Grading & rubric usage checker")
        .block(
            Block::default()
                .title(TITLE)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(title, chunks[0]);

    let text = Paragraph::new(format!("{}_", input))
        .block(
            Block::default()
                .title("Course IDs (separated by comma, space or newline)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(text, chunks[1]);

    let status = Paragraph::new(message.unwrap_or(""))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);

    frame.render_widget(status, chunks[2]);

    let help = Paragraph::new("[Type or paste IDs | Enter: Check | Backspace: Delete | Esc: Quit]")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[3]);
}

fn render_running(frame: &mut Frame, progress: &FetchProgress) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area);

    let title = Paragraph::new("Checking courses...")
        .block(
            Block::default()
                .title(TITLE)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(title, chunks[0]);

    let gauge = Gauge::default()
        .block(Block::default().title("Progress").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(progress.percentage() as u16)
        .label(format!(
            "{}/{} courses | {} errors",
            progress.completed, progress.total_courses, progress.errors
        ));

    frame.render_widget(gauge, chunks[1]);

    let status_items: Vec<ListItem> = progress
        .status_messages
        .iter()
        .map(|msg| {
            let color = if msg.trim_start().starts_with('✗') {
                Color::Red
            } else {
                Color::Green
            };
            ListItem::new(format!("• {}", msg)).style(Style::default().fg(color))
        })
        .collect();

    let status_list = List::new(status_items).block(
        Block::default()
            .title("Status Log")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(status_list, chunks[2]);

    let info_text = match progress.current_course {
        Some(course_id) => format!("Current course: {} | [q: Quit]", course_id),
        None => "Preparing... | [q: Quit]".to_string(),
    };

    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan));

    frame.render_widget(info, chunks[3]);
}

fn header_lines(report: &CourseReport) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    match &report.header {
        Some(header) => {
            let account_id = header
                .course
                .account_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(vec![
                Span::styled("Sub-account: ", bold),
                Span::raw(format!("{} (ID: {})", header.sub_account_name, account_id)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Course: ", bold),
                Span::raw(format!("{} (ID: {})", header.course.display_name(), report.course_id)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Version: ", bold),
                Span::raw(header.course.course_code.clone().unwrap_or_default()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Code: ", bold),
                Span::raw(header.course.display_sis_id().to_string()),
            ]));
        }
        None => lines.push(Line::from(Span::styled(
            format!("Course {}: information unavailable", report.course_id),
            Style::default().fg(Color::Red),
        ))),
    }

    if let CourseBody::Table { massive: true, .. } = report.body {
        lines.push(Line::from(Span::styled(
            "CURSO MASIVO",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }

    for issue in &report.issues {
        lines.push(Line::from(Span::styled(
            issue.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

fn summary_items(summary: &[RubricSummaryLine]) -> Vec<ListItem<'static>> {
    summary
        .iter()
        .map(|line| {
            let (label, color) = match line.presence {
                RubricPresence::Massive => ("ES MASIVO", Color::Green),
                RubricPresence::Present => ("Sí", Color::Green),
                RubricPresence::Missing => ("No", Color::Red),
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("- {}: ¿Tiene rúbrica asociada? ", line.assignment)),
                Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ]))
        })
        .collect()
}

fn column_width(text: &str, min: usize, max: usize) -> Constraint {
    Constraint::Length(text.chars().count().clamp(min, max) as u16)
}

fn render_grid(frame: &mut Frame, area: Rect, grid: &GradeGrid, view: &ResultsView) {
    let first = 1 + view.column_offset;
    let visible: Vec<usize> = std::iter::once(0)
        .chain(first..grid.columns.len())
        .collect();

    let student_width = grid
        .rows
        .iter()
        .map(|r| r.student.chars().count())
        .max()
        .unwrap_or(0)
        .max(grid.columns[0].chars().count());

    let widths: Vec<Constraint> = visible
        .iter()
        .map(|&i| {
            if i == 0 {
                Constraint::Length(student_width.clamp(12, 32) as u16)
            } else {
                column_width(&grid.columns[i], 10, 24)
            }
        })
        .collect();

    let header = Row::new(
        visible
            .iter()
            .map(|&i| Cell::from(grid.columns[i].clone())),
    )
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = grid
        .rows
        .iter()
        .skip(view.row_offset)
        .map(|row| {
            let cells = visible.iter().map(|&i| {
                if i == 0 {
                    Cell::from(row.student.clone())
                } else {
                    let mark = row.marks[i - 1];
                    Cell::from(mark.as_str()).style(mark_style(mark))
                }
            });
            Row::new(cells)
        })
        .collect();

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!("Students: {}", grid.rows.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(table, area);
}

fn render_results(frame: &mut Frame, view: &ResultsView) {
    let area = frame.area();

    let Some(report) = view.current() else {
        render_error(frame, "No courses were checked.");
        return;
    };

    let header = header_lines(report);
    let summary_len = match &report.body {
        CourseBody::Table { rubric_summary, .. } => rubric_summary.len(),
        CourseBody::NoAssignments => 1,
    };

    let header_height = header.len() as u16 + 2;
    let footer_height = if view.notice.is_some() { 4 } else { 3 };
    // The summary takes whatever the grid does not need
    let summary_room = area
        .height
        .saturating_sub(header_height + footer_height + GRID_MIN_HEIGHT)
        .max(3);
    let summary_height = (summary_len as u16 + 2).min(summary_room);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Length(summary_height),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(footer_height),
        ])
        .split(area);

    let header_block = Paragraph::new(header)
        .block(
            Block::default()
                .title(format!(
                    "{} - course {}/{}",
                    TITLE,
                    view.selected + 1,
                    view.reports.len()
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(header_block, chunks[0]);

    match &report.body {
        CourseBody::Table {
            rubric_summary,
            grid,
            ..
        } => {
            let visible = chunks[1].height.saturating_sub(2) as usize;
            let total = rubric_summary.len();
            let offset = view.summary_offset.min(total.saturating_sub(visible));
            let title = if total > visible {
                format!(
                    "Assignment information ({}-{} of {}) [j/k: Scroll]",
                    offset + 1,
                    (offset + visible).min(total),
                    total
                )
            } else {
                "Assignment information".to_string()
            };
            let items: Vec<ListItem> = summary_items(rubric_summary)
                .into_iter()
                .skip(offset)
                .collect();
            let summary =
                List::new(items).block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(summary, chunks[1]);
            render_grid(frame, chunks[2], grid, view);
        }
        CourseBody::NoAssignments => {
            let message = Paragraph::new(format!(
                "No assignments found or the API query failed for course {}.",
                report.course_id
            ))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
        }
    }

    let mut footer = vec![Line::from(format!(
        "Elapsed: {:.2} s | [Tab: Next course | ←→↑↓: Scroll | j/k: Summary | e: Export CSV | Enter: New query | q: Quit]",
        view.elapsed.as_secs_f64()
    ))];
    if let Some(notice) = &view.notice {
        footer.push(Line::from(notice.clone()));
    }

    let help = Paragraph::new(footer)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[3]);
}

fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let text = vec![
        Line::from(vec![Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(message),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, chunks[0]);

    let help = Paragraph::new("[Enter: Continue | q: Quit]")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[1]);
}
