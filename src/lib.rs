//! Pet-care tracking: routines, health logs and a recurring-schedule engine
//! that turns repeating care tasks into a sorted "upcoming" list.

pub mod commands;
pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod schedule;
pub mod storage;
pub mod tui;

pub use error::{CareError, ValidationError};
pub use labels::d_day_label;
pub use models::{Frequency, FrequencyRule, Lenient, Medication, MedicationFrequency, RecurringTask, UpcomingEntry};
pub use schedule::{compute_upcoming, Resolution, SkipReason};
