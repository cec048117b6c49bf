use bananacare::commands::*;
use bananacare::error::{CareError, ValidationError};
use bananacare::models::{FrequencyRule, MedicationFrequency, RoutineSlot, PM_COLOR};
use bananacare::storage::load_state;
use chrono::{NaiveDate, NaiveTime};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn with_test_db<F>(f: F)
where
    F: FnOnce(PathBuf),
{
    let dir = TempDir::new().unwrap();
    f(dir.path().join("banana-care.json"));
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn test_recurring_add_and_upcoming() {
    with_test_db(|db| {
        let monthly = parse_frequency("monthly", None, Some(15), None, None).unwrap();
        cmd_recurring_add(&db, "발톱관리", monthly, None, true).unwrap();
        let weekly = parse_frequency("weekly", Some(1), None, None, None).unwrap();
        cmd_recurring_add(&db, "목욕", weekly, Some("#FDF0D5".into()), true).unwrap();
        cmd_med_add(&db, "심장사상충", MedicationFrequency::Monthly, None, None, true).unwrap();

        let upcoming = cmd_upcoming(&db, date(2025, 1, 20), true).unwrap();
        let labels: Vec<&str> = upcoming.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["목욕", "심장사상충", "발톱관리"]);
        assert_eq!(upcoming[0].color, "#FDF0D5");
        assert_eq!(upcoming[2].days_remaining, 26);
    });
}

#[test]
fn test_recurring_labels_are_unique() {
    with_test_db(|db| {
        let daily = parse_frequency("daily", None, None, None, None).unwrap();
        cmd_recurring_add(&db, "양치", daily, None, true).unwrap();
        let err = cmd_recurring_add(&db, "양치", daily, None, true).unwrap_err();
        assert!(matches!(err, CareError::Duplicate { .. }));
        assert_eq!(load_state(&db).recurring.len(), 1);
    });
}

#[test]
fn test_recurring_edit_replaces_in_place() {
    with_test_db(|db| {
        let daily = parse_frequency("daily", None, None, None, None).unwrap();
        cmd_recurring_add(&db, "귀청소", daily, None, true).unwrap();
        cmd_recurring_add(&db, "미용", daily, None, true).unwrap();

        let yearly = parse_frequency("yearly", None, Some(15), Some(3), Some("2025-01-01")).unwrap();
        cmd_recurring_edit(&db, "귀청소", Some("귀 청소".into()), Some(yearly), Some("#000000".into()), true)
            .unwrap();

        let state = load_state(&db);
        assert_eq!(state.recurring[0].label, "귀 청소");
        assert_eq!(state.recurring[0].color, "#000000");
        let f = state.recurring[0].known_frequency().unwrap();
        assert_eq!(f.rule, FrequencyRule::Yearly { month: 3, day: 15 });
        assert_eq!(f.start_date, Some(date(2025, 1, 1)));

        let err = cmd_recurring_edit(&db, "귀 청소", Some("미용".into()), None, None, true).unwrap_err();
        assert!(matches!(err, CareError::Duplicate { .. }));
        let err = cmd_recurring_remove(&db, "없음", true).unwrap_err();
        assert!(matches!(err, CareError::NotFound { .. }));
    });
}

#[test]
fn test_log_marks_timeline_and_calendar() {
    with_test_db(|db| {
        let today = date(2025, 8, 5);
        cmd_log(&db, "산책", None, today, time(7, 30), true).unwrap();
        cmd_log(&db, "산책", None, today, time(19, 0), true).unwrap();
        cmd_log(&db, "간식", Some("#123456".into()), date(2025, 8, 6), time(9, 0), true).unwrap();

        let entries = cmd_today(&db, today, true).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].time, time(19, 0));
        assert_eq!(entries[0].color, PM_COLOR);

        let days = cmd_calendar(&db, 2025, 8, true).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0], (today, vec!["산책".to_string()]));
    });
}

#[test]
fn test_routine_add_remove() {
    with_test_db(|db| {
        cmd_routine_add(&db, RoutineSlot::Reg, "귀청소", true).unwrap();
        cmd_routine_add(&db, RoutineSlot::Reg, "귀청소", true).unwrap();
        let state = load_state(&db);
        assert_eq!(state.routine.reg.iter().filter(|l| *l == "귀청소").count(), 1);

        cmd_routine_remove(&db, RoutineSlot::Am, "양치", true).unwrap();
        assert!(!load_state(&db).routine.am.contains(&"양치".to_string()));
        assert!(cmd_routine_remove(&db, RoutineSlot::Am, "양치", true).is_err());
    });
}

#[test]
fn test_weight_tracks_change() {
    with_test_db(|db| {
        cmd_weight_add(&db, 2.55, date(2025, 8, 14), time(13, 14), true).unwrap();
        let second = cmd_weight_add(&db, 2.85, date(2025, 8, 15), time(13, 14), true).unwrap();
        assert_eq!(second.diff, 0.3);

        let err = cmd_weight_add(&db, -1.0, date(2025, 8, 15), time(13, 14), true).unwrap_err();
        assert!(matches!(err, CareError::Validation(ValidationError::Weight(_))));
        assert_eq!(load_state(&db).weight.len(), 2);
    });
}

#[test]
fn test_walk_minutes_default_to_span() {
    with_test_db(|db| {
        let walk = cmd_walk_add(&db, time(7, 0), time(8, 15), None, date(2025, 8, 5), true).unwrap();
        assert_eq!(walk.minutes, 75);
        let walk = cmd_walk_add(&db, time(7, 0), time(8, 0), Some(40), date(2025, 8, 5), true).unwrap();
        assert_eq!(walk.minutes, 40);

        let err = cmd_walk_add(&db, time(9, 0), time(8, 0), None, date(2025, 8, 5), true).unwrap_err();
        assert!(matches!(err, CareError::Validation(ValidationError::WalkRange { .. })));
        assert_eq!(load_state(&db).walks.len(), 2);
    });
}

#[test]
fn test_med_log_defaults() {
    with_test_db(|db| {
        let entry = cmd_med_log(&db, None, None, date(2025, 8, 5), time(8, 0), true).unwrap();
        assert_eq!(entry.kind, DEFAULT_MED_KIND);
        assert_eq!(entry.dose, DEFAULT_MED_DOSE);
        assert_eq!(load_state(&db).med_log.len(), 1);

        cmd_med_add(&db, "항생제", MedicationFrequency::Once, None, None, true).unwrap();
        assert!(cmd_upcoming(&db, date(2025, 8, 5), true).unwrap().is_empty());
        cmd_med_remove(&db, "항생제", true).unwrap();
        assert!(load_state(&db).medications.is_empty());
    });
}

#[test]
fn test_diary_shows_on_calendar() {
    with_test_db(|db| {
        cmd_diary_add(&db, "오늘은 바나나가 산책을 오래 했다", date(2025, 9, 3), true).unwrap();
        let days = cmd_calendar(&db, 2025, 9, true).unwrap();
        assert_eq!(days, vec![(date(2025, 9, 3), Vec::new())]);
        assert!(cmd_calendar(&db, 2025, 13, true).is_err());
    });
}

#[test]
fn test_hand_edited_document_still_schedules_valid_tasks() {
    with_test_db(|db| {
        fs::write(
            &db,
            r##"{"recurring": [
                {"label": "예방접종", "color": "#DDF7FA", "frequency": {"type": "yearly", "month": 3, "day": 15}},
                {"label": "귀청소", "color": "#F9E1F1", "frequency": {"type": "biweekly"}}
            ]}"##,
        )
        .unwrap();
        let upcoming = cmd_upcoming(&db, date(2025, 3, 16), true).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].next_date, date(2026, 3, 15));
    });
}

#[test]
fn test_reset() {
    with_test_db(|db| {
        cmd_diary_add(&db, "memo", date(2025, 9, 3), true).unwrap();
        assert!(db.exists());
        cmd_reset(&db, true).unwrap();
        assert!(!db.exists());
    });
}

#[test]
fn test_corrupt_document_is_not_overwritten() {
    with_test_db(|db| {
        let broken = r##"{"recurring":[{"label":"발톱관리","color":"#F9E1F1","frequency":{"type":"daily"}}],"diary":[{"date":"2025-08-01","text":"keep me"}],}"##;
        fs::write(&db, broken).unwrap();

        let err = cmd_log(&db, "산책", None, date(2025, 8, 5), time(7, 30), true).unwrap_err();
        assert!(matches!(err, CareError::Corrupt { .. }));
        assert_eq!(fs::read_to_string(&db).unwrap(), broken);

        // read-only views still fall back to defaults
        assert!(cmd_upcoming(&db, date(2025, 8, 5), true).unwrap().is_empty());
    });
}

#[test]
fn test_unrecognised_frequency_survives_unrelated_saves() {
    with_test_db(|db| {
        fs::write(
            &db,
            r##"{"recurring":[{"label":"목욕","color":"#FDF0D5","frequency":{"type":"weekly","weekday":"3"}}]}"##,
        )
        .unwrap();
        cmd_diary_add(&db, "산책 잘 했음", date(2025, 8, 5), true).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&db).unwrap()).unwrap();
        assert_eq!(
            raw["recurring"][0]["frequency"],
            serde_json::json!({"type": "weekly", "weekday": "3"})
        );
        assert!(cmd_upcoming(&db, date(2025, 8, 5), true).unwrap().is_empty());
    });
}
