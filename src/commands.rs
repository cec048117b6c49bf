use std::io::{self, Write};
use std::path::Path;

use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::{CareError, Result, ValidationError};
use crate::labels::{d_day_label, parse_hex_color};
use crate::models::{
    CareState, DiaryEntry, Frequency, FrequencyRule, Lenient, MedLogEntry, Medication, MedicationFrequency,
    RecurringTask, RoutineSlot, TimelineEntry, UpcomingEntry, WalkEntry, WeightEntry, AM_COLOR,
};
use crate::schedule::{compute_upcoming, rule_in_range};
use crate::storage::{delete_state, load_state, update_state};

pub const DEFAULT_MED_KIND: &str = "슬개골약";
pub const DEFAULT_MED_DOSE: &str = "1알";

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ValidationError::Date(s.to_string()))
}

/// Parses an `HH:MM` time.
pub fn parse_time(s: &str) -> std::result::Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| ValidationError::Time(s.to_string()))
}

/// Builds a frequency from command-line pieces.
///
/// Unlike stored data, anything incomplete or out of range is rejected here.
pub fn parse_frequency(
    kind: &str,
    weekday: Option<u32>,
    day: Option<u32>,
    month: Option<u32>,
    start: Option<&str>,
) -> std::result::Result<Frequency, ValidationError> {
    let missing = |field: &str| ValidationError::Frequency(format!("{} needs --{}", kind, field));
    let rule = match kind.trim().to_lowercase().as_str() {
        "daily" => FrequencyRule::Daily,
        "weekly" => FrequencyRule::Weekly {
            weekday: weekday.ok_or_else(|| missing("weekday"))?,
        },
        "monthly" => FrequencyRule::Monthly {
            day: day.ok_or_else(|| missing("day"))?,
        },
        "yearly" => FrequencyRule::Yearly {
            month: month.ok_or_else(|| missing("month"))?,
            day: day.ok_or_else(|| missing("day"))?,
        },
        other => {
            return Err(ValidationError::Frequency(format!(
                "unknown frequency '{}', expected daily, weekly, monthly or yearly",
                other
            )))
        }
    };
    if !rule_in_range(&rule) {
        return Err(ValidationError::Frequency(format!(
            "{:?} is outside the calendar (weekday 0-6, month 1-12, day 1-31)",
            rule
        )));
    }
    let mut frequency = Frequency::new(rule);
    if let Some(start) = start {
        frequency = frequency.starting(parse_date(start)?);
    }
    Ok(frequency)
}

/// Builds an optional replacement frequency for an edit.
///
/// Rule fields given without a frequency kind are rejected rather than dropped.
pub fn parse_frequency_change(
    kind: Option<&str>,
    weekday: Option<u32>,
    day: Option<u32>,
    month: Option<u32>,
    start: Option<&str>,
) -> std::result::Result<Option<Frequency>, ValidationError> {
    match kind {
        Some(kind) => parse_frequency(kind, weekday, day, month, start).map(Some),
        None if weekday.is_some() || day.is_some() || month.is_some() || start.is_some() => {
            Err(ValidationError::Frequency(
                "--weekday, --day, --month and --start need --every".into(),
            ))
        }
        None => Ok(None),
    }
}

fn swatch(color: &str) -> Cell {
    match parse_hex_color(color) {
        Some((r, g, b)) => Cell::new("●").fg(Color::Rgb { r, g, b }),
        None => Cell::new("●"),
    }
}

fn header(cols: &[&str]) -> Vec<Cell> {
    cols.iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(cols: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(cols));
    table
}

/// Lists upcoming recurring tasks and medications, soonest first.
pub fn cmd_upcoming(db: &Path, today: NaiveDate, silent: bool) -> Result<Vec<UpcomingEntry>> {
    let state = load_state(db);
    let entries = compute_upcoming(&state.recurring, &state.medications, today);
    tracing::info!(count = entries.len(), %today, "computed upcoming schedule");
    if silent {
        return Ok(entries);
    }
    if entries.is_empty() {
        println!("예정 없음 (nothing upcoming).");
        return Ok(entries);
    }

    let mut table = new_table(&["", "When", "Label", "Date", "Kind"]);
    for e in &entries {
        let when = d_day_label(e.days_remaining);
        let when_cell = if e.days_remaining == 0 {
            Cell::new(when).fg(Color::Red).add_attribute(Attribute::Bold)
        } else if e.days_remaining <= 3 {
            Cell::new(when).fg(Color::Yellow)
        } else {
            Cell::new(when)
        };
        table.add_row(vec![
            swatch(&e.color),
            when_cell,
            Cell::new(&e.label),
            Cell::new(e.next_date.format("%Y-%m-%d (%a)")),
            Cell::new(if e.is_medication { "medication" } else { "routine" }),
        ]);
    }
    println!("{table}");
    Ok(entries)
}

/// Shows today's logged completions, newest first, and the routine chips.
pub fn cmd_today(db: &Path, today: NaiveDate, silent: bool) -> Result<Vec<TimelineEntry>> {
    let state = load_state(db);
    let mut entries: Vec<TimelineEntry> = state.timeline_on(today).cloned().collect();
    entries.reverse();
    if silent {
        return Ok(entries);
    }

    println!("오늘 요약 {}", today);
    if entries.is_empty() {
        println!("아직 기록이 없어요 (nothing logged yet).");
    } else {
        let mut table = new_table(&["", "Time", "Label"]);
        for t in &entries {
            table.add_row(vec![
                swatch(&t.color),
                Cell::new(t.time.format("%H:%M")),
                Cell::new(&t.label),
            ]);
        }
        println!("{table}");
    }
    for slot in RoutineSlot::ALL {
        println!("{}: {}", slot.title(), state.routine.slot(slot).join(" · "));
    }
    Ok(entries)
}

/// Logs a completed routine at the given moment.
///
/// Without an explicit color the routine's slot color is used, then the
/// matching recurring task's color.
pub fn cmd_log(
    db: &Path,
    label: &str,
    color: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    silent: bool,
) -> Result<()> {
    update_state(db, |state| {
        let color = color
            .or_else(|| state.routine.slot_of(label).map(|s| s.color().to_string()))
            .or_else(|| {
                state
                    .recurring
                    .iter()
                    .find(|t| t.label == label)
                    .map(|t| t.color.clone())
            })
            .unwrap_or_else(|| AM_COLOR.to_string());
        state.log_completion(date, time, label, &color);
        Ok(())
    })?;
    tracing::info!(%label, %date, "logged completion");
    if !silent {
        println!("Logged '{}' at {} {}.", label, date, time.format("%H:%M"));
    }
    Ok(())
}

pub fn cmd_routine_add(db: &Path, slot: RoutineSlot, label: &str, silent: bool) -> Result<()> {
    let added = update_state(db, |state| Ok(state.routine.insert(slot, label)))?;
    if !silent {
        if added {
            println!("Routine '{}' added to {}.", label, slot.title());
        } else {
            println!("Routine '{}' is already in {}.", label, slot.title());
        }
    }
    Ok(())
}

pub fn cmd_routine_remove(db: &Path, slot: RoutineSlot, label: &str, silent: bool) -> Result<()> {
    update_state(db, |state| {
        if state.routine.remove(slot, label) {
            Ok(())
        } else {
            Err(CareError::not_found("routine", label))
        }
    })?;
    if !silent {
        println!("Routine '{}' removed from {}.", label, slot.title());
    }
    Ok(())
}

pub fn cmd_routine_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    let mut table = new_table(&["Slot", "Routines"]);
    for slot in RoutineSlot::ALL {
        table.add_row(vec![
            Cell::new(slot.title()),
            Cell::new(state.routine.slot(slot).join(", ")),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Adds a recurring task. Labels are unique.
pub fn cmd_recurring_add(
    db: &Path,
    label: &str,
    frequency: Frequency,
    color: Option<String>,
    silent: bool,
) -> Result<()> {
    update_state(db, |state| {
        if state.recurring.iter().any(|t| t.label == label) {
            return Err(CareError::duplicate("recurring task", label));
        }
        let mut task = RecurringTask::new(label, frequency);
        if let Some(c) = color {
            task = task.with_color(c);
        }
        state.recurring.push(task);
        Ok(())
    })?;
    if !silent {
        println!("Recurring task '{}' added ({}).", label, frequency);
    }
    Ok(())
}

/// Replaces a recurring task's label, frequency or color in place.
pub fn cmd_recurring_edit(
    db: &Path,
    label: &str,
    new_label: Option<String>,
    frequency: Option<Frequency>,
    color: Option<String>,
    silent: bool,
) -> Result<()> {
    update_state(db, |state| {
        if let Some(n) = &new_label {
            if n != label && state.recurring.iter().any(|t| &t.label == n) {
                return Err(CareError::duplicate("recurring task", n.clone()));
            }
        }
        let task = state
            .recurring
            .iter_mut()
            .find(|t| t.label == label)
            .ok_or_else(|| CareError::not_found("recurring task", label))?;
        if let Some(n) = new_label {
            task.label = n;
        }
        if let Some(f) = frequency {
            task.frequency = Some(Lenient::Known(f));
        }
        if let Some(c) = color {
            task.color = c;
        }
        Ok(())
    })?;
    if !silent {
        println!("Recurring task '{}' updated.", label);
    }
    Ok(())
}

pub fn cmd_recurring_remove(db: &Path, label: &str, silent: bool) -> Result<()> {
    update_state(db, |state| {
        let len_before = state.recurring.len();
        state.recurring.retain(|t| t.label != label);
        if state.recurring.len() == len_before {
            return Err(CareError::not_found("recurring task", label));
        }
        Ok(())
    })?;
    if !silent {
        println!("Recurring task '{}' removed.", label);
    }
    Ok(())
}

pub fn cmd_recurring_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    if state.recurring.is_empty() {
        println!("No recurring tasks.");
        return Ok(());
    }
    let mut table = new_table(&["", "Label", "Frequency"]);
    for t in &state.recurring {
        let frequency = t
            .frequency
            .as_ref()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "(not scheduled)".into());
        table.add_row(vec![swatch(&t.color), Cell::new(&t.label), Cell::new(frequency)]);
    }
    println!("{table}");
    Ok(())
}

/// Adds a recurring medication. Names are unique.
pub fn cmd_med_add(
    db: &Path,
    name: &str,
    frequency: MedicationFrequency,
    start: Option<NaiveDate>,
    color: Option<String>,
    silent: bool,
) -> Result<()> {
    update_state(db, |state| {
        if state.medications.iter().any(|m| m.name == name) {
            return Err(CareError::duplicate("medication", name));
        }
        let mut med = Medication::new(name, frequency);
        med.start_date = start;
        if let Some(c) = color {
            med.color = c;
        }
        state.medications.push(med);
        Ok(())
    })?;
    if !silent {
        println!("Medication '{}' added ({}).", name, frequency);
    }
    Ok(())
}

pub fn cmd_med_remove(db: &Path, name: &str, silent: bool) -> Result<()> {
    update_state(db, |state| {
        let len_before = state.medications.len();
        state.medications.retain(|m| m.name != name);
        if state.medications.len() == len_before {
            return Err(CareError::not_found("medication", name));
        }
        Ok(())
    })?;
    if !silent {
        println!("Medication '{}' removed.", name);
    }
    Ok(())
}

pub fn cmd_med_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    if !state.medications.is_empty() {
        let mut table = new_table(&["", "Name", "Frequency", "Start"]);
        for m in &state.medications {
            table.add_row(vec![
                swatch(&m.color),
                Cell::new(&m.name),
                Cell::new(m.frequency.as_ref().map(|f| f.to_string()).unwrap_or_else(|| "-".into())),
                Cell::new(m.start_date.map(|d| d.to_string()).unwrap_or_default()),
            ]);
        }
        println!("{table}");
    }
    if state.med_log.is_empty() {
        println!("기록 없음 (no doses logged).");
        return Ok(());
    }
    let mut table = new_table(&["날짜", "시간", "약 종류", "용량"]);
    for m in state.med_log.iter().rev() {
        table.add_row(vec![
            Cell::new(m.date),
            Cell::new(m.time.format("%H:%M")),
            Cell::new(&m.kind),
            Cell::new(&m.dose),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Records a dose that was given.
pub fn cmd_med_log(
    db: &Path,
    kind: Option<String>,
    dose: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    silent: bool,
) -> Result<MedLogEntry> {
    let entry = MedLogEntry {
        date,
        time,
        kind: kind.unwrap_or_else(|| DEFAULT_MED_KIND.to_string()),
        dose: dose.unwrap_or_else(|| DEFAULT_MED_DOSE.to_string()),
    };
    update_state(db, |state| {
        state.med_log.push(entry.clone());
        Ok(())
    })?;
    if !silent {
        println!("Logged {} {}.", entry.kind, entry.dose);
    }
    Ok(entry)
}

pub fn cmd_weight_add(
    db: &Path,
    kg: f64,
    date: NaiveDate,
    time: NaiveTime,
    silent: bool,
) -> Result<WeightEntry> {
    if !kg.is_finite() || kg <= 0.0 {
        return Err(ValidationError::Weight(kg.to_string()).into());
    }
    let entry = update_state(db, |state| Ok(state.add_weight(date, time, kg).clone()))?;
    if !silent {
        println!("Weight {} kg recorded ({}).", entry.kg, format_diff(entry.diff));
    }
    Ok(entry)
}

fn format_diff(diff: f64) -> String {
    if diff > 0.0 {
        format!("+ {} kg", diff)
    } else {
        format!("{} kg", diff)
    }
}

pub fn cmd_weight_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    if state.weight.is_empty() {
        println!("기록 없음 (no weights recorded).");
        return Ok(());
    }
    let mut table = new_table(&["날짜", "시간", "몸무게", "변화량"]);
    for w in state.weight.iter().rev() {
        let diff_cell = if w.diff > 0.0 {
            Cell::new(format_diff(w.diff)).fg(Color::Red)
        } else if w.diff < 0.0 {
            Cell::new(format_diff(w.diff)).fg(Color::Blue)
        } else {
            Cell::new(format_diff(w.diff))
        };
        table.add_row(vec![
            Cell::new(w.date),
            Cell::new(w.time.format("%H:%M")),
            Cell::new(format!("{} kg", w.kg)),
            diff_cell,
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Records a walk. Minutes default to the span between start and end.
pub fn cmd_walk_add(
    db: &Path,
    start: NaiveTime,
    end: NaiveTime,
    minutes: Option<u32>,
    date: NaiveDate,
    silent: bool,
) -> Result<WalkEntry> {
    if end < start {
        return Err(ValidationError::WalkRange {
            start: start.format("%H:%M").to_string(),
            end: end.format("%H:%M").to_string(),
        }
        .into());
    }
    let minutes = minutes.unwrap_or_else(|| (end - start).num_minutes() as u32);
    let entry = WalkEntry {
        date,
        start,
        end,
        minutes,
    };
    update_state(db, |state| {
        state.walks.push(entry.clone());
        Ok(())
    })?;
    if !silent {
        println!("Walk of {} minutes recorded.", minutes);
    }
    Ok(entry)
}

pub fn cmd_walk_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    if state.walks.is_empty() {
        println!("기록 없음 (no walks recorded).");
        return Ok(());
    }
    let mut table = new_table(&["날짜", "시작시간", "종료시간", "분"]);
    for w in state.walks.iter().rev() {
        table.add_row(vec![
            Cell::new(w.date),
            Cell::new(w.start.format("%H:%M")),
            Cell::new(w.end.format("%H:%M")),
            Cell::new(w.minutes),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_diary_add(db: &Path, text: &str, date: NaiveDate, silent: bool) -> Result<()> {
    update_state(db, |state| {
        state.diary.push(DiaryEntry {
            date,
            text: text.to_string(),
        });
        Ok(())
    })?;
    if !silent {
        println!("Diary entry saved for {}.", date);
    }
    Ok(())
}

pub fn cmd_diary_list(db: &Path) -> Result<()> {
    let state = load_state(db);
    if state.diary.is_empty() {
        println!("No diary entries.");
        return Ok(());
    }
    let mut table = new_table(&["Date", "Entry"]);
    for d in state.diary.iter().rev() {
        table.add_row(vec![Cell::new(d.date), Cell::new(&d.text)]);
    }
    println!("{table}");
    Ok(())
}

/// Lists the labels logged on each day of a month, with diary markers.
pub fn cmd_calendar(
    db: &Path,
    year: i32,
    month: u32,
    silent: bool,
) -> Result<Vec<(NaiveDate, Vec<String>)>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::Date(format!("{}-{:02}", year, month)))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ValidationError::Date(format!("{}-{:02}", year, month)))?;
    let state = load_state(db);
    let days = month_marks(&state, first, next);
    if silent {
        return Ok(days);
    }

    println!("{}", first.format("%Y년 %m월"));
    if days.is_empty() {
        println!("기록 없음 (nothing logged this month).");
        return Ok(days);
    }
    let mut table = new_table(&["Date", "Logged", "Diary"]);
    for (date, labels) in &days {
        let has_diary = state.diary.iter().any(|d| d.date == *date);
        table.add_row(vec![
            Cell::new(date.format("%m-%d (%a)")),
            Cell::new(labels.join(", ")),
            Cell::new(if has_diary { "✎" } else { "" }),
        ]);
    }
    println!("{table}");
    Ok(days)
}

fn month_marks(state: &CareState, first: NaiveDate, next: NaiveDate) -> Vec<(NaiveDate, Vec<String>)> {
    let mut days: Vec<(NaiveDate, Vec<String>)> = state
        .calendar
        .range(first..next)
        .filter(|(_, labels)| !labels.is_empty())
        .map(|(d, labels)| (*d, labels.clone()))
        .collect();
    for d in state.diary.iter().filter(|d| d.date >= first && d.date < next) {
        if !days.iter().any(|(date, _)| *date == d.date) {
            days.push((d.date, Vec::new()));
        }
    }
    days.sort_by_key(|(d, _)| *d);
    days
}

/// Moves `(year, month)` by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let shifted = first.and_then(|d| {
        if delta >= 0 {
            d.checked_add_months(Months::new(delta.unsigned_abs()))
        } else {
            d.checked_sub_months(Months::new(delta.unsigned_abs()))
        }
    });
    match shifted {
        Some(d) => (d.year(), d.month()),
        None => (year, month),
    }
}

/// Resets the database by deleting the care document.
pub fn cmd_reset(db: &Path, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all care records? This cannot be undone. [y/N] ");
        io::stdout().flush().map_err(|e| CareError::io(db, e))?;
        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| CareError::io(db, e))?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    delete_state(db)?;
    tracing::info!(path = %db.display(), "care data reset");
    println!("Care data reset successfully.");
    Ok(())
}
