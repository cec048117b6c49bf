//! Recurring-schedule engine.
//!
//! Given the recurring care tasks and medications plus a reference day,
//! works out when each one next falls due and how many days away that is.
//! Nothing here reads the clock; "today" always comes in as an argument.

use chrono::{DateTime, Datelike, Local, Months, NaiveDate};

use crate::error::ValidationError;
use crate::models::{
    Frequency, FrequencyRule, Medication, MedicationFrequency, RecurringTask, UpcomingEntry,
};

/// Weekday medications fall due on (Sunday).
pub const MEDICATION_WEEKDAY: u32 = 0;
/// Day of month medications fall due on.
pub const MEDICATION_MONTH_DAY: u32 = 1;
/// Calendar date medications fall due on each year (March 15).
pub const MEDICATION_YEARLY: (u32, u32) = (3, 15);

/// Why an item produced no upcoming entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No frequency, or one that could not be understood.
    MissingFrequency,
    /// Weekday, month or day outside what a calendar allows.
    OutOfRange,
    /// Medication given a single time.
    OneOff,
    /// The next occurrence falls before the rule's start date.
    NotYetActive { start: NaiveDate, next: NaiveDate },
    /// No valid date could be built while rolling forward.
    Unresolvable,
}

/// Outcome of scheduling one task or medication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Due(UpcomingEntry),
    Skipped(SkipReason),
}

impl Resolution {
    pub fn entry(self) -> Option<UpcomingEntry> {
        match self {
            Resolution::Due(entry) => Some(entry),
            Resolution::Skipped(_) => None,
        }
    }
}

/// Computes the upcoming list for `reference`, soonest first.
///
/// Recurring tasks come before medications among entries due the same day;
/// otherwise input order is kept for ties.
pub fn compute_upcoming(
    tasks: &[RecurringTask],
    medications: &[Medication],
    reference: NaiveDate,
) -> Vec<UpcomingEntry> {
    let task_entries = tasks.iter().filter_map(|task| {
        match resolve_task(task, reference) {
            Resolution::Due(entry) => Some(entry),
            Resolution::Skipped(reason) => {
                tracing::debug!(label = %task.label, ?reason, "recurring task not scheduled");
                None
            }
        }
    });
    let medication_entries = medications.iter().filter_map(|med| {
        match resolve_medication(med, reference) {
            Resolution::Due(entry) => Some(entry),
            Resolution::Skipped(reason) => {
                tracing::debug!(name = %med.name, ?reason, "medication not scheduled");
                None
            }
        }
    });

    let mut entries: Vec<UpcomingEntry> = task_entries.chain(medication_entries).collect();
    // stable: ties keep input order
    entries.sort_by_key(|entry| entry.days_remaining);
    entries
}

/// Schedules a single recurring task.
pub fn resolve_task(task: &RecurringTask, reference: NaiveDate) -> Resolution {
    let Some(frequency) = task.known_frequency() else {
        return Resolution::Skipped(SkipReason::MissingFrequency);
    };
    resolve(&task.label, &task.color, frequency, false, reference)
}

/// Schedules a single medication using the fixed medication anchors.
pub fn resolve_medication(med: &Medication, reference: NaiveDate) -> Resolution {
    let rule = match med.known_frequency() {
        None => return Resolution::Skipped(SkipReason::MissingFrequency),
        Some(MedicationFrequency::Once) => return Resolution::Skipped(SkipReason::OneOff),
        Some(MedicationFrequency::Daily) => FrequencyRule::Daily,
        Some(MedicationFrequency::Weekly) => FrequencyRule::Weekly {
            weekday: MEDICATION_WEEKDAY,
        },
        Some(MedicationFrequency::Monthly) => FrequencyRule::Monthly {
            day: MEDICATION_MONTH_DAY,
        },
        Some(MedicationFrequency::Yearly) => FrequencyRule::Yearly {
            month: MEDICATION_YEARLY.0,
            day: MEDICATION_YEARLY.1,
        },
    };
    let frequency = Frequency {
        rule,
        start_date: med.start_date,
    };
    resolve(&med.name, &med.color, frequency, true, reference)
}

fn resolve(
    label: &str,
    color: &str,
    frequency: Frequency,
    is_medication: bool,
    reference: NaiveDate,
) -> Resolution {
    if !rule_in_range(&frequency.rule) {
        return Resolution::Skipped(SkipReason::OutOfRange);
    }
    let Some(next) = next_occurrence(&frequency.rule, reference) else {
        return Resolution::Skipped(SkipReason::Unresolvable);
    };
    if let Some(start) = frequency.start_date {
        if next < start {
            return Resolution::Skipped(SkipReason::NotYetActive { start, next });
        }
    }
    Resolution::Due(UpcomingEntry {
        label: label.to_string(),
        color: color.to_string(),
        next_date: next,
        days_remaining: days_between(reference, next),
        is_medication,
    })
}

/// Whether every field of `rule` names something a calendar can hold.
///
/// Yearly dates are checked against a leap year so February 29 is accepted.
pub fn rule_in_range(rule: &FrequencyRule) -> bool {
    match *rule {
        FrequencyRule::Daily => true,
        FrequencyRule::Weekly { weekday } => weekday <= 6,
        FrequencyRule::Monthly { day } => (1..=31).contains(&day),
        FrequencyRule::Yearly { month, day } => NaiveDate::from_ymd_opt(2000, month, day).is_some(),
    }
}

/// The soonest date on or after `reference` that satisfies `rule`.
pub fn next_occurrence(rule: &FrequencyRule, reference: NaiveDate) -> Option<NaiveDate> {
    match *rule {
        FrequencyRule::Daily => Some(reference),
        FrequencyRule::Weekly { weekday } => next_weekday(weekday, reference),
        FrequencyRule::Monthly { day } => next_month_day(day, reference),
        FrequencyRule::Yearly { month, day } => next_yearly(month, day, reference),
    }
}

fn next_weekday(weekday: u32, reference: NaiveDate) -> Option<NaiveDate> {
    if weekday > 6 {
        return None;
    }
    let today = reference.weekday().num_days_from_sunday();
    let delta = (weekday + 7 - today) % 7;
    reference.checked_add_days(chrono::Days::new(u64::from(delta)))
}

// A month lacking `day` is skipped rather than clamped, so day 31 seen from
// February lands on March 31.
fn next_month_day(day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    let this_month = NaiveDate::from_ymd_opt(reference.year(), reference.month(), day);
    if let Some(candidate) = this_month {
        if candidate >= reference {
            return Some(candidate);
        }
    }
    let first = reference.with_day(1)?;
    (1..=2).find_map(|ahead| {
        let month = first.checked_add_months(Months::new(ahead))?;
        NaiveDate::from_ymd_opt(month.year(), month.month(), day)
    })
}

fn next_yearly(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    // February 29 only exists every fourth year or so; eight covers the
    // century gaps.
    (0..=8).find_map(|ahead| {
        let candidate = NaiveDate::from_ymd_opt(reference.year() + ahead, month, day)?;
        (candidate >= reference).then_some(candidate)
    })
}

/// Whole calendar days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Parses a reference date given as `YYYY-MM-DD`.
pub fn reference_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::ReferenceDate(input.to_string()))
}

/// Truncates a local timestamp to its calendar day.
pub fn reference_from(now: DateTime<Local>) -> NaiveDate {
    now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(label: &str, rule: FrequencyRule) -> RecurringTask {
        RecurringTask::new(label, Frequency::new(rule))
    }

    #[test]
    fn daily_is_always_today() {
        for reference in [date(2024, 2, 29), date(2025, 1, 1), date(2025, 12, 31)] {
            let next = next_occurrence(&FrequencyRule::Daily, reference);
            assert_eq!(next, Some(reference));
        }
    }

    #[test]
    fn weekly_lands_on_requested_weekday_within_a_week() {
        let reference = date(2025, 1, 20); // Monday
        for weekday in 0..=6 {
            let next = next_occurrence(&FrequencyRule::Weekly { weekday }, reference).unwrap();
            assert_eq!(next.weekday().num_days_from_sunday(), weekday);
            assert!((0..=6).contains(&days_between(reference, next)));
        }
        let sunday = next_occurrence(&FrequencyRule::Weekly { weekday: 0 }, reference).unwrap();
        assert_eq!(sunday, date(2025, 1, 26));
        assert_eq!(sunday.weekday(), Weekday::Sun);
    }

    #[test]
    fn weekly_on_same_weekday_is_today() {
        let reference = date(2025, 1, 22); // Wednesday
        assert_eq!(
            next_occurrence(&FrequencyRule::Weekly { weekday: 3 }, reference),
            Some(reference)
        );
    }

    #[test]
    fn monthly_later_this_month_or_next() {
        let rule = FrequencyRule::Monthly { day: 15 };
        assert_eq!(next_occurrence(&rule, date(2025, 1, 10)), Some(date(2025, 1, 15)));
        assert_eq!(next_occurrence(&rule, date(2025, 1, 20)), Some(date(2025, 2, 15)));
        assert_eq!(next_occurrence(&rule, date(2025, 12, 20)), Some(date(2026, 1, 15)));
    }

    #[test]
    fn monthly_day_31_from_february_skips_to_march() {
        let rule = FrequencyRule::Monthly { day: 31 };
        assert_eq!(next_occurrence(&rule, date(2025, 2, 10)), Some(date(2025, 3, 31)));
        assert_eq!(next_occurrence(&rule, date(2024, 2, 29)), Some(date(2024, 3, 31)));
    }

    #[test]
    fn monthly_rolls_past_a_short_next_month() {
        // January 30 has passed and February has no 30th.
        let rule = FrequencyRule::Monthly { day: 30 };
        assert_eq!(next_occurrence(&rule, date(2025, 1, 31)), Some(date(2025, 3, 30)));
    }

    #[test]
    fn yearly_moves_to_next_year_once_passed() {
        let rule = FrequencyRule::Yearly { month: 3, day: 15 };
        let next = next_occurrence(&rule, date(2025, 3, 16)).unwrap();
        assert_eq!(next, date(2026, 3, 15));
        assert_eq!(days_between(date(2025, 3, 16), next), 364);
        assert_eq!(next_occurrence(&rule, date(2025, 3, 15)), Some(date(2025, 3, 15)));
    }

    #[test]
    fn yearly_leap_day_waits_for_leap_year() {
        let rule = FrequencyRule::Yearly { month: 2, day: 29 };
        assert_eq!(next_occurrence(&rule, date(2025, 3, 1)), Some(date(2028, 2, 29)));
    }

    #[test]
    fn out_of_range_rules_are_skipped() {
        let reference = date(2025, 1, 20);
        for rule in [
            FrequencyRule::Weekly { weekday: 7 },
            FrequencyRule::Monthly { day: 0 },
            FrequencyRule::Monthly { day: 32 },
            FrequencyRule::Yearly { month: 13, day: 1 },
            FrequencyRule::Yearly { month: 4, day: 31 },
        ] {
            assert_eq!(
                resolve_task(&task("x", rule), reference),
                Resolution::Skipped(SkipReason::OutOfRange),
                "{:?}",
                rule
            );
        }
    }

    #[test]
    fn task_without_frequency_is_skipped() {
        let mut t = task("귀청소", FrequencyRule::Daily);
        t.frequency = None;
        assert_eq!(
            resolve_task(&t, date(2025, 1, 1)),
            Resolution::Skipped(SkipReason::MissingFrequency)
        );
    }

    #[test]
    fn start_date_gates_occurrences_before_it() {
        let start = date(2025, 3, 1);
        let t = RecurringTask::new(
            "예방접종",
            Frequency::new(FrequencyRule::Monthly { day: 15 }).starting(start),
        );
        assert_eq!(
            resolve_task(&t, date(2025, 1, 20)),
            Resolution::Skipped(SkipReason::NotYetActive {
                start,
                next: date(2025, 2, 15)
            })
        );
        let due = resolve_task(&t, date(2025, 3, 1)).entry().unwrap();
        assert_eq!(due.next_date, date(2025, 3, 15));
        assert_eq!(due.days_remaining, 14);
    }

    #[test]
    fn once_medication_never_scheduled() {
        let med = Medication::new("항생제", MedicationFrequency::Once);
        assert_eq!(
            resolve_medication(&med, date(2025, 1, 1)),
            Resolution::Skipped(SkipReason::OneOff)
        );
    }

    #[test]
    fn medication_uses_fixed_anchors() {
        let reference = date(2025, 1, 20); // Monday
        let weekly = resolve_medication(&Medication::new("a", MedicationFrequency::Weekly), reference)
            .entry()
            .unwrap();
        assert_eq!(weekly.next_date, date(2025, 1, 26));
        assert!(weekly.is_medication);

        let monthly = resolve_medication(&Medication::new("b", MedicationFrequency::Monthly), reference)
            .entry()
            .unwrap();
        assert_eq!(monthly.next_date, date(2025, 2, 1));

        let yearly = resolve_medication(&Medication::new("c", MedicationFrequency::Yearly), reference)
            .entry()
            .unwrap();
        assert_eq!(yearly.next_date, date(2025, 3, 15));
    }

    #[test]
    fn reference_date_rejects_non_dates() {
        assert_eq!(reference_date("2025-01-20"), Ok(date(2025, 1, 20)));
        assert_eq!(
            reference_date("not-a-date"),
            Err(ValidationError::ReferenceDate("not-a-date".into()))
        );
        assert!(reference_date("2025-02-30").is_err());
    }
}
