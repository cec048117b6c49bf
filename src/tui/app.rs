use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, NaiveTime};
use ratatui::widgets::TableState;

use crate::commands::{cmd_calendar, cmd_diary_add, cmd_log, cmd_weight_add, shift_month};
use crate::models::{CareState, RoutineSlot, UpcomingEntry};
use crate::schedule::compute_upcoming;
use crate::storage::load_state;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Clone, Copy, PartialEq)]
pub enum ViewMode {
    Home,
    Routines,
    Health,
    Calendar,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Home,
        ViewMode::Routines,
        ViewMode::Health,
        ViewMode::Calendar,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Home => "오늘",
            ViewMode::Routines => "루틴",
            ViewMode::Health => "건강",
            ViewMode::Calendar => "캘린더",
        }
    }

    fn index(self) -> usize {
        ViewMode::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }
}

pub enum InputField {
    None,
    Weight,
    Diary,
}

pub struct App {
    pub db: PathBuf,
    pub today: NaiveDate,
    /// Time stamped on entries logged from the dashboard.
    pub clock: fn() -> NaiveTime,
    pub care: CareState,
    pub upcoming: Vec<UpcomingEntry>,
    /// Routine chips in display order: morning, evening, periodic.
    pub chips: Vec<(RoutineSlot, String)>,
    pub chip_state: TableState,
    pub month: (i32, u32),
    pub month_marks: Vec<(NaiveDate, Vec<String>)>,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub status: Option<String>,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(db: PathBuf, today: NaiveDate, clock: fn() -> NaiveTime) -> App {
        let mut app = App {
            db,
            today,
            clock,
            care: CareState::default(),
            upcoming: Vec::new(),
            chips: Vec::new(),
            chip_state: TableState::default(),
            month: (today.year(), today.month()),
            month_marks: Vec::new(),
            view_mode: ViewMode::Home,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            status: None,
        };
        app.reload();
        app
    }

    /// Re-reads the document and recomputes everything derived from it.
    pub fn reload(&mut self) {
        self.care = load_state(&self.db);
        self.upcoming = compute_upcoming(&self.care.recurring, &self.care.medications, self.today);
        self.chips = RoutineSlot::ALL
            .into_iter()
            .flat_map(|slot| {
                self.care
                    .routine
                    .slot(slot)
                    .iter()
                    .map(move |label| (slot, label.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        match self.chip_state.selected() {
            _ if self.chips.is_empty() => self.chip_state.select(None),
            Some(i) if i >= self.chips.len() => self.chip_state.select(Some(self.chips.len() - 1)),
            None => self.chip_state.select(Some(0)),
            _ => {}
        }
        self.reload_month();
    }

    fn reload_month(&mut self) {
        let (year, month) = self.month;
        self.month_marks = match cmd_calendar(&self.db, year, month, true) {
            Ok(days) => days,
            Err(e) => {
                self.status = Some(e.to_string());
                Vec::new()
            }
        };
    }

    /// Selects the next routine chip.
    pub fn next(&mut self) {
        if self.chips.is_empty() {
            return;
        }
        let i = match self.chip_state.selected() {
            Some(i) if i + 1 < self.chips.len() => i + 1,
            _ => 0,
        };
        self.chip_state.select(Some(i));
    }

    /// Selects the previous routine chip.
    pub fn previous(&mut self) {
        if self.chips.is_empty() {
            return;
        }
        let i = match self.chip_state.selected() {
            Some(0) | None => self.chips.len() - 1,
            Some(i) => i - 1,
        };
        self.chip_state.select(Some(i));
    }

    pub fn next_view(&mut self) {
        let i = (self.view_mode.index() + 1) % ViewMode::ALL.len();
        self.view_mode = ViewMode::ALL[i];
    }

    pub fn previous_view(&mut self) {
        let len = ViewMode::ALL.len();
        let i = (self.view_mode.index() + len - 1) % len;
        self.view_mode = ViewMode::ALL[i];
    }

    /// Pages the calendar by `delta` months.
    pub fn shift_calendar(&mut self, delta: i32) {
        self.month = shift_month(self.month.0, self.month.1, delta);
        self.reload_month();
    }

    /// Logs the selected routine chip as done now.
    pub fn log_selected(&mut self) {
        let Some((slot, label)) = self.chip_state.selected().and_then(|i| self.chips.get(i)).cloned()
        else {
            return;
        };
        let time = (self.clock)();
        match cmd_log(&self.db, &label, Some(slot.color().to_string()), self.today, time, true) {
            Ok(()) => self.status = Some(format!("'{}' 기록 완료", label)),
            Err(e) => self.status = Some(e.to_string()),
        }
        self.reload();
    }

    pub fn start_edit(&mut self, field: InputField) {
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Applies the text typed into the input box.
    pub fn handle_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        let result = match self.input_field {
            InputField::Weight => match input.parse::<f64>() {
                Ok(kg) => cmd_weight_add(&self.db, kg, self.today, (self.clock)(), true)
                    .map(|w| format!("몸무게 {} kg 기록", w.kg)),
                Err(_) => Err(crate::error::ValidationError::Weight(input.clone()).into()),
            },
            InputField::Diary if !input.is_empty() => {
                cmd_diary_add(&self.db, &input, self.today, true).map(|_| "다이어리 저장".to_string())
            }
            InputField::Diary | InputField::None => Ok(String::new()),
        };
        self.status = match result {
            Ok(msg) if msg.is_empty() => None,
            Ok(msg) => Some(msg),
            Err(e) => Some(e.to_string()),
        };
        self.cancel_input();
        self.reload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn logging_selected_chip_lands_on_timeline() {
        let dir = tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        let mut app = App::new(dir.path().join("care.json"), today, noon);
        assert_eq!(app.chips.len(), 9);

        app.previous(); // wraps to the last periodic chip
        app.log_selected();

        let logged: Vec<_> = app.care.timeline_on(today).collect();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].label, "발톱깎기");
        assert_eq!(logged[0].time, noon());
        assert_eq!(app.month_marks.len(), 1);
    }

    #[test]
    fn weight_input_is_recorded() {
        let dir = tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        let mut app = App::new(dir.path().join("care.json"), today, noon);
        app.start_edit(InputField::Weight);
        app.input_buffer.push_str("2.85");
        app.handle_input();
        assert_eq!(app.care.weight.len(), 1);
        assert!(app.input_mode == InputMode::Normal);

        app.start_edit(InputField::Weight);
        app.input_buffer.push_str("heavy");
        app.handle_input();
        assert_eq!(app.care.weight.len(), 1);
        assert!(app.status.is_some());
    }

    #[test]
    fn views_cycle_both_ways() {
        let dir = tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        let mut app = App::new(dir.path().join("care.json"), today, noon);
        app.previous_view();
        assert!(app.view_mode == ViewMode::Calendar);
        app.next_view();
        assert!(app.view_mode == ViewMode::Home);
    }
}
