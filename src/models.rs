use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

pub const AM_COLOR: &str = "#E6F4EA";
pub const PM_COLOR: &str = "#E7F0FF";
pub const REG_COLOR: &str = "#FDF0D5";
pub const RECURRING_COLOR: &str = "#F9E1F1";
pub const MEDICATION_COLOR: &str = "#DDF7FA";

/// When a recurring task falls due.
///
/// Weekdays count from Sunday (`0`) to Saturday (`6`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FrequencyRule {
    Daily,
    Weekly {
        #[serde(deserialize_with = "whole_number")]
        weekday: u32,
    },
    Monthly {
        #[serde(deserialize_with = "whole_number")]
        day: u32,
    },
    Yearly {
        #[serde(deserialize_with = "whole_number")]
        month: u32,
        #[serde(deserialize_with = "whole_number")]
        day: u32,
    },
}

/// A frequency rule together with the first date it may produce an occurrence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    #[serde(flatten)]
    pub rule: FrequencyRule,
    #[serde(default, rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl Frequency {
    pub fn new(rule: FrequencyRule) -> Self {
        Self {
            rule,
            start_date: None,
        }
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            FrequencyRule::Daily => write!(f, "daily")?,
            FrequencyRule::Weekly { weekday } => write!(f, "weekly on {}", weekday_name(weekday))?,
            FrequencyRule::Monthly { day } => write!(f, "monthly on day {}", day)?,
            FrequencyRule::Yearly { month, day } => write!(f, "yearly on {:02}-{:02}", month, day)?,
        }
        if let Some(start) = self.start_date {
            write!(f, " from {}", start)?;
        }
        Ok(())
    }
}

fn weekday_name(weekday: u32) -> &'static str {
    match weekday {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "?",
    }
}

/// A stored value that is kept verbatim when it cannot be understood.
///
/// Unrecognized values are written back unchanged on the next save.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Known(T),
    Unrecognized(serde_json::Value),
}

impl<T: Copy> Lenient<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Lenient::Known(value) => Some(*value),
            Lenient::Unrecognized(_) => None,
        }
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lenient::Known(value) => value.serialize(serializer),
            Lenient::Unrecognized(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) => Ok(Lenient::Known(value)),
            Err(err) => {
                tracing::warn!(%err, %raw, "keeping unrecognised frequency as stored");
                Ok(Lenient::Unrecognized(raw))
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lenient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lenient::Known(value) => fmt::Display::fmt(value, f),
            Lenient::Unrecognized(raw) => write!(f, "unrecognised {}", raw),
        }
    }
}

/// A user-defined care activity that repeats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecurringTask {
    /// Display name, unique within the recurring list.
    pub label: String,
    /// Swatch color shown next to the task. Opaque to scheduling.
    #[serde(default = "default_recurring_color")]
    pub color: String,
    /// Repeat rule. Tasks without a recognised rule are never scheduled.
    #[serde(default)]
    pub frequency: Option<Lenient<Frequency>>,
}

impl RecurringTask {
    pub fn new(label: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            label: label.into(),
            color: default_recurring_color(),
            frequency: Some(Lenient::Known(frequency)),
        }
    }

    /// The repeat rule, if one is stored and understood.
    pub fn known_frequency(&self) -> Option<Frequency> {
        self.frequency.as_ref().and_then(Lenient::known)
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// How often a medication is given.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MedicationFrequency {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for MedicationFrequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(ValidationError::Frequency(format!(
                "unknown medication frequency '{}', expected once, daily, weekly, monthly or yearly",
                other
            ))),
        }
    }
}

impl fmt::Display for MedicationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

/// A medication that is given on a repeating schedule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Medication {
    /// Medication name, unique within the medication list.
    pub name: String,
    #[serde(default = "default_medication_color")]
    pub color: String,
    /// Flat repeat kind.
    #[serde(default)]
    pub frequency: Option<Lenient<MedicationFrequency>>,
    #[serde(default, rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl Medication {
    pub fn new(name: impl Into<String>, frequency: MedicationFrequency) -> Self {
        Self {
            name: name.into(),
            color: default_medication_color(),
            frequency: Some(Lenient::Known(frequency)),
            start_date: None,
        }
    }

    /// The repeat kind, if one is stored and understood.
    pub fn known_frequency(&self) -> Option<MedicationFrequency> {
        self.frequency.as_ref().and_then(Lenient::known)
    }
}

/// A computed occurrence. Never persisted.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UpcomingEntry {
    pub label: String,
    pub color: String,
    pub next_date: NaiveDate,
    /// Whole calendar days from the reference date to `next_date`.
    pub days_remaining: i64,
    pub is_medication: bool,
}

/// Which routine list a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineSlot {
    Am,
    Pm,
    Reg,
}

impl RoutineSlot {
    pub const ALL: [RoutineSlot; 3] = [RoutineSlot::Am, RoutineSlot::Pm, RoutineSlot::Reg];

    pub fn color(self) -> &'static str {
        match self {
            RoutineSlot::Am => AM_COLOR,
            RoutineSlot::Pm => PM_COLOR,
            RoutineSlot::Reg => REG_COLOR,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RoutineSlot::Am => "오전",
            RoutineSlot::Pm => "오후",
            RoutineSlot::Reg => "정기루틴",
        }
    }
}

impl FromStr for RoutineSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "am" => Ok(RoutineSlot::Am),
            "pm" => Ok(RoutineSlot::Pm),
            "reg" => Ok(RoutineSlot::Reg),
            other => Err(ValidationError::Slot(other.to_string())),
        }
    }
}

/// Daily and periodic routine labels offered as quick-log chips.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoutineLists {
    #[serde(default)]
    pub am: Vec<String>,
    #[serde(default)]
    pub pm: Vec<String>,
    #[serde(default)]
    pub reg: Vec<String>,
}

impl Default for RoutineLists {
    fn default() -> Self {
        Self {
            am: vec!["양치".into(), "아침식사".into(), "눈영양제".into()],
            pm: vec!["산책".into(), "저녁식사".into(), "관절영양제".into()],
            reg: vec!["목욕".into(), "미용".into(), "발톱깎기".into()],
        }
    }
}

impl RoutineLists {
    pub fn slot(&self, slot: RoutineSlot) -> &[String] {
        match slot {
            RoutineSlot::Am => &self.am,
            RoutineSlot::Pm => &self.pm,
            RoutineSlot::Reg => &self.reg,
        }
    }

    fn slot_mut(&mut self, slot: RoutineSlot) -> &mut Vec<String> {
        match slot {
            RoutineSlot::Am => &mut self.am,
            RoutineSlot::Pm => &mut self.pm,
            RoutineSlot::Reg => &mut self.reg,
        }
    }

    /// Appends `label` unless the slot already holds it. Returns whether it was added.
    pub fn insert(&mut self, slot: RoutineSlot, label: &str) -> bool {
        let list = self.slot_mut(slot);
        if list.iter().any(|l| l == label) {
            return false;
        }
        list.push(label.to_string());
        true
    }

    /// Returns whether `label` was present.
    pub fn remove(&mut self, slot: RoutineSlot, label: &str) -> bool {
        let list = self.slot_mut(slot);
        let len_before = list.len();
        list.retain(|l| l != label);
        list.len() != len_before
    }

    /// Finds the slot holding `label`, checking morning, evening then periodic lists.
    pub fn slot_of(&self, label: &str) -> Option<RoutineSlot> {
        RoutineSlot::ALL
            .into_iter()
            .find(|slot| self.slot(*slot).iter().any(|l| l == label))
    }
}

/// A logged completion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub label: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kg: f64,
    /// Change from the previous entry, rounded to 0.1 kg.
    #[serde(default)]
    pub diff: f64,
}

/// A medication dose that was given.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MedLogEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: String,
    pub dose: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WalkEntry {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub minutes: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiaryEntry {
    pub date: NaiveDate,
    pub text: String,
}

/// The whole persisted document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CareState {
    #[serde(default)]
    pub routine: RoutineLists,
    #[serde(default)]
    pub recurring: Vec<RecurringTask>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    /// Labels logged on each day, without repeats.
    #[serde(default)]
    pub calendar: BTreeMap<NaiveDate, Vec<String>>,
    #[serde(default)]
    pub weight: Vec<WeightEntry>,
    #[serde(default)]
    pub med_log: Vec<MedLogEntry>,
    #[serde(default)]
    pub walks: Vec<WalkEntry>,
    #[serde(default)]
    pub diary: Vec<DiaryEntry>,
}

impl CareState {
    /// Records a completion on the timeline and marks the calendar day.
    pub fn log_completion(&mut self, date: NaiveDate, time: NaiveTime, label: &str, color: &str) {
        self.timeline.push(TimelineEntry {
            date,
            time,
            label: label.to_string(),
            color: color.to_string(),
        });
        let day = self.calendar.entry(date).or_default();
        if !day.iter().any(|l| l == label) {
            day.push(label.to_string());
        }
    }

    /// Appends a weight reading, computing its change from the last reading.
    pub fn add_weight(&mut self, date: NaiveDate, time: NaiveTime, kg: f64) -> &WeightEntry {
        let diff = match self.weight.last() {
            Some(prev) if prev.kg > 0.0 => ((kg - prev.kg) * 10.0).round() / 10.0,
            _ => 0.0,
        };
        self.weight.push(WeightEntry {
            date,
            time,
            kg,
            diff,
        });
        &self.weight[self.weight.len() - 1]
    }

    pub fn timeline_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimelineEntry> {
        self.timeline.iter().filter(move |t| t.date == date)
    }
}

fn default_recurring_color() -> String {
    RECURRING_COLOR.to_string()
}

fn default_medication_color() -> String {
    MEDICATION_COLOR.to_string()
}

/// Accepts integral numbers written either way, e.g. `3` or `3.0`.
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u32),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Float(f) if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) => Ok(f as u32),
        Number::Float(f) => Err(de::Error::custom(format!("expected a whole number, found {}", f))),
    }
}
