use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
    Frame,
};
use crate::labels::{d_day_label, parse_hex_color};
use super::app::{App, InputField, InputMode, ViewMode};

fn header_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn swatch(color: &str) -> Cell<'static> {
    let style = match parse_hex_color(color) {
        Some((r, g, b)) => Style::default().fg(Color::Rgb(r, g, b)),
        None => Style::default(),
    };
    Cell::from("●").style(style)
}

fn empty_row(text: &'static str) -> Row<'static> {
    Row::new(vec![Cell::from(""), Cell::from(text)]).style(Style::default().fg(Color::DarkGray))
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Help / status
        ].as_ref())
        .split(f.area());

    let titles: Vec<Line> = ViewMode::ALL.iter().map(|v| Line::from(v.title())).collect();
    let selected = ViewMode::ALL.iter().position(|v| *v == app.view_mode).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title(format!("Banana Care - {}", app.today)))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    match app.view_mode {
        ViewMode::Home => render_home(f, app, chunks[1]),
        ViewMode::Routines => render_routines(f, app, chunks[1]),
        ViewMode::Health => render_health(f, app, chunks[1]),
        ViewMode::Calendar => render_calendar(f, app, chunks[1]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match &app.status {
            Some(status) => status.clone(),
            None => match app.view_mode {
                ViewMode::Routines => "q: Quit | Tab: View | j/k: Select | Enter: Log | w: Weight | e: Diary".to_string(),
                ViewMode::Calendar => "q: Quit | Tab: View | [/]: Month | w: Weight | e: Diary".to_string(),
                _ => "q: Quit | Tab: View | w: Weight | e: Diary | r: Reload".to_string(),
            },
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel".to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Editing {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);
        let title = match app.input_field {
            InputField::Weight => "몸무게 입력 (kg)",
            InputField::Diary => "다이어리",
            InputField::None => "",
        };
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
    }
}

fn render_home(f: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let mut timeline: Vec<Row> = app
        .care
        .timeline_on(app.today)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|t| {
            Row::new(vec![
                swatch(&t.color),
                Cell::from(t.time.format("%H:%M").to_string()),
                Cell::from(t.label.clone()),
            ])
        })
        .collect();
    if timeline.is_empty() {
        timeline.push(empty_row("아직 기록이 없어요"));
    }
    let timeline = Table::new(
        timeline,
        [Constraint::Length(2), Constraint::Length(6), Constraint::Min(10)],
    )
    .block(Block::default().borders(Borders::ALL).title("오늘 요약"));
    f.render_widget(timeline, halves[0]);

    let mut upcoming: Vec<Row> = app
        .upcoming
        .iter()
        .map(|e| {
            let style = if e.days_remaining == 0 {
                Style::default().fg(Color::Red)
            } else if e.days_remaining <= 3 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                swatch(&e.color),
                Cell::from(d_day_label(e.days_remaining)).style(style),
                Cell::from(e.label.clone()),
                Cell::from(e.next_date.format("%m-%d (%a)").to_string()),
                Cell::from(if e.is_medication { "💊" } else { "" }),
            ])
        })
        .collect();
    if upcoming.is_empty() {
        upcoming.push(empty_row("예정 없음"));
    }
    let upcoming = Table::new(
        upcoming,
        [
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(10),
            Constraint::Length(12),
            Constraint::Length(3),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title("다가오는 일정"));
    f.render_widget(upcoming, halves[1]);
}

fn render_routines(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .chips
        .iter()
        .map(|(slot, label)| {
            Row::new(vec![
                swatch(slot.color()),
                Cell::from(slot.title()),
                Cell::from(label.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(2), Constraint::Length(10), Constraint::Min(10)],
    )
    .header(Row::new(vec!["", "구분", "루틴"]).style(header_style()).bottom_margin(1))
    .block(Block::default().borders(Borders::ALL).title("데일리루틴 / 정기루틴"))
    .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.chip_state);
}

fn render_health(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ].as_ref())
        .split(area);

    let weight: Vec<Row> = app
        .care
        .weight
        .iter()
        .rev()
        .map(|w| {
            let diff = if w.diff > 0.0 {
                format!("+{}", w.diff)
            } else {
                format!("{}", w.diff)
            };
            Row::new(vec![
                Cell::from(w.date.format("%m-%d").to_string()),
                Cell::from(format!("{} kg", w.kg)),
                Cell::from(diff),
            ])
        })
        .collect();
    let weight = Table::new(
        weight,
        [Constraint::Length(6), Constraint::Length(9), Constraint::Min(5)],
    )
    .header(Row::new(vec!["날짜", "몸무게", "변화량"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL).title("몸무게"));
    f.render_widget(weight, columns[0]);

    let meds: Vec<Row> = app
        .care
        .med_log
        .iter()
        .rev()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.date.format("%m-%d").to_string()),
                Cell::from(m.kind.clone()),
                Cell::from(m.dose.clone()),
            ])
        })
        .collect();
    let meds = Table::new(
        meds,
        [Constraint::Length(6), Constraint::Min(8), Constraint::Length(6)],
    )
    .header(Row::new(vec!["날짜", "약 종류", "용량"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL).title("투약 기록"));
    f.render_widget(meds, columns[1]);

    let walks: Vec<Row> = app
        .care
        .walks
        .iter()
        .rev()
        .map(|w| {
            Row::new(vec![
                Cell::from(w.date.format("%m-%d").to_string()),
                Cell::from(format!("{}-{}", w.start.format("%H:%M"), w.end.format("%H:%M"))),
                Cell::from(w.minutes.to_string()),
            ])
        })
        .collect();
    let walks = Table::new(
        walks,
        [Constraint::Length(6), Constraint::Length(11), Constraint::Min(3)],
    )
    .header(Row::new(vec!["날짜", "시간", "분"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL).title("산책 기록"));
    f.render_widget(walks, columns[2]);
}

fn render_calendar(f: &mut Frame, app: &App, area: Rect) {
    let mut rows: Vec<Row> = app
        .month_marks
        .iter()
        .map(|(date, labels)| {
            let has_diary = app.care.diary.iter().any(|d| d.date == *date);
            let style = if *date == app.today {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(date.format("%d (%a)").to_string()),
                Cell::from(labels.join(", ")),
                Cell::from(if has_diary { "✎" } else { "" }),
            ])
            .style(style)
        })
        .collect();
    if rows.is_empty() {
        rows.push(empty_row("기록 없음"));
    }
    let (year, month) = app.month;
    let table = Table::new(
        rows,
        [Constraint::Length(9), Constraint::Min(10), Constraint::Length(2)],
    )
    .block(Block::default().borders(Borders::ALL).title(format!("{}년 {:02}월", year, month)));
    f.render_widget(table, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
