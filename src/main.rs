//! # Banana Care
//!
//! A terminal pet-care tracker. Log daily routines, weight, medication,
//! walks and diary entries, and see which recurring care tasks come up next.
//!
//! ## Features
//!
//! *   **Upcoming schedule**: Recurring tasks (daily, weekly, monthly, yearly, with an optional
//!     start date) and recurring medications are sorted by how many days remain.
//! *   **Dual Interface**:
//!     *   **CLI**: Scriptable and quick for single commands.
//!     *   **TUI**: Dashboard with today's timeline, routine chips, health logs and a calendar.
//! *   **Routines**: Morning, evening and periodic routine chips for one-keystroke logging.
//! *   **Health logs**: Weight with change tracking, medication doses and walks.
//! *   **Data Persistence**: Everything lives in one JSON document in the XDG data directory.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! bananacare
//! # or explicitly
//! bananacare ui
//! ```
//!
//! *   `Tab` / `←` `→`: Switch view
//! *   `j` / `k`: Select routine
//! *   `Enter`: Log the selected routine
//! *   `w`: Record weight
//! *   `e`: Write a diary entry
//! *   `[` / `]`: Previous / next month in the calendar
//! *   `q`: Quit
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # Recurring care tasks
//! bananacare recurring add 발톱관리 --every monthly --day 15
//! bananacare recurring add 목욕 --every weekly --weekday 6 --start 2025-03-01
//!
//! # What is coming up
//! bananacare upcoming
//! bananacare upcoming --today 2025-01-20
//!
//! # Logging
//! bananacare log 산책
//! bananacare weight add 2.85
//! bananacare walk add 07:00 08:00
//! bananacare med log --kind 슬개골약 --dose 1알
//! ```
//!
//! ## Data Storage
//!
//! *   Linux: `~/.local/share/bananacare/banana-care.json`
//! *   macOS: `~/Library/Application Support/bananacare/banana-care.json`
//! *   Windows: `%APPDATA%\bananacare\banana-care.json`
//!
//! Override with `BANANA_CARE_DB`. `BANANA_CARE_TODAY` pins the reference date and
//! `BANANA_CARE_LOG` sets the log level.

use std::io;
use std::process::ExitCode;

use chrono::Datelike;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use bananacare::commands::*;
use bananacare::config::{clock_time, Config};
use bananacare::error::CareError;
use bananacare::models::{MedicationFrequency, RoutineSlot};
use bananacare::tui::run_tui;

#[derive(Parser)]
#[command(name = "bananacare")]
#[command(about = "Pet-care routine and health tracker", long_about = None)]
struct Cli {
    /// Reference date (YYYY-MM-DD) used instead of today
    #[arg(long, global = true)]
    today: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming recurring tasks and medications
    Upcoming,
    /// Show today's timeline and routines
    Today,
    /// Log a completed routine
    Log {
        /// Routine label
        label: String,
        /// Swatch color (#RRGGBB)
        #[arg(short, long)]
        color: Option<String>,
        /// Time in HH:MM (defaults to now)
        #[arg(short, long)]
        at: Option<String>,
    },
    /// Manage routine chips
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },
    /// Manage recurring care tasks
    Recurring {
        #[command(subcommand)]
        command: RecurringCommands,
    },
    /// Manage medications
    Med {
        #[command(subcommand)]
        command: MedCommands,
    },
    /// Weight records
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Walk records
    Walk {
        #[command(subcommand)]
        command: WalkCommands,
    },
    /// Diary entries
    Diary {
        #[command(subcommand)]
        command: DiaryCommands,
    },
    /// Show what was logged during a month
    Calendar {
        /// Month in YYYY-MM (defaults to the current month)
        month: Option<String>,
    },
    /// Reset the database (delete all care records)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum RoutineCommands {
    /// Add a routine to a slot (am, pm, reg)
    Add { slot: String, label: String },
    /// Remove a routine from a slot
    Remove { slot: String, label: String },
    /// List routines
    List,
}

#[derive(clap::Args)]
struct FrequencyArgs {
    /// daily, weekly, monthly or yearly
    #[arg(short, long)]
    every: Option<String>,
    /// Day of week, 0 = Sunday
    #[arg(long)]
    weekday: Option<u32>,
    /// Day of month
    #[arg(long)]
    day: Option<u32>,
    /// Month of year
    #[arg(long)]
    month: Option<u32>,
    /// First date the task may fall due (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,
}

#[derive(Subcommand)]
enum RecurringCommands {
    /// Add a recurring task
    Add {
        label: String,
        #[command(flatten)]
        frequency: FrequencyArgs,
        /// Swatch color (#RRGGBB)
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Edit a recurring task
    Edit {
        label: String,
        /// New label
        #[arg(short, long)]
        rename: Option<String>,
        #[command(flatten)]
        frequency: FrequencyArgs,
        /// New swatch color
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a recurring task
    Remove { label: String },
    /// List recurring tasks
    List,
}

#[derive(Subcommand)]
enum MedCommands {
    /// Add a recurring medication
    Add {
        name: String,
        /// once, daily, weekly, monthly or yearly
        #[arg(short, long, default_value = "daily")]
        frequency: String,
        /// First date the medication may fall due (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a recurring medication
    Remove { name: String },
    /// Record a dose that was given
    Log {
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        dose: Option<String>,
    },
    /// List medications and doses
    List,
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Record a weight in kg
    Add { kg: f64 },
    /// List weights
    List,
}

#[derive(Subcommand)]
enum WalkCommands {
    /// Record a walk (HH:MM HH:MM)
    Add {
        start: String,
        end: String,
        /// Minutes walked (defaults to end - start)
        #[arg(short, long)]
        minutes: Option<u32>,
    },
    /// List walks
    List,
}

#[derive(Subcommand)]
enum DiaryCommands {
    /// Write a diary entry
    Add { text: String },
    /// List diary entries
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::from_env().and_then(|c| c.with_today(cli.today.as_deref())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(config.log_level)
        .init();
    if let Some(level) = &config.ignored_log_level {
        tracing::warn!(%level, "ignoring unknown BANANA_CARE_LOG level");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn frequency_from(args: &FrequencyArgs, kind: &str) -> Result<bananacare::Frequency, CareError> {
    Ok(parse_frequency(
        kind,
        args.weekday,
        args.day,
        args.month,
        args.start.as_deref(),
    )?)
}

fn run(command: Option<Commands>, config: &Config) -> Result<(), CareError> {
    let db = config.db_path.as_path();
    let today = config.today();
    match command {
        Some(Commands::Upcoming) => cmd_upcoming(db, today, false).map(drop),
        Some(Commands::Today) => cmd_today(db, today, false).map(drop),
        Some(Commands::Log { label, color, at }) => {
            let time = match at {
                Some(t) => parse_time(&t)?,
                None => clock_time(),
            };
            cmd_log(db, &label, color, today, time, false)
        }
        Some(Commands::Routine { command }) => match command {
            RoutineCommands::Add { slot, label } => {
                cmd_routine_add(db, slot.parse::<RoutineSlot>()?, &label, false)
            }
            RoutineCommands::Remove { slot, label } => {
                cmd_routine_remove(db, slot.parse::<RoutineSlot>()?, &label, false)
            }
            RoutineCommands::List => cmd_routine_list(db),
        },
        Some(Commands::Recurring { command }) => match command {
            RecurringCommands::Add { label, frequency, color } => {
                let kind = frequency.every.clone().unwrap_or_else(|| "daily".into());
                let frequency = frequency_from(&frequency, &kind)?;
                cmd_recurring_add(db, &label, frequency, color, false)
            }
            RecurringCommands::Edit { label, rename, frequency, color } => {
                let frequency = parse_frequency_change(
                    frequency.every.as_deref(),
                    frequency.weekday,
                    frequency.day,
                    frequency.month,
                    frequency.start.as_deref(),
                )?;
                cmd_recurring_edit(db, &label, rename, frequency, color, false)
            }
            RecurringCommands::Remove { label } => cmd_recurring_remove(db, &label, false),
            RecurringCommands::List => cmd_recurring_list(db),
        },
        Some(Commands::Med { command }) => match command {
            MedCommands::Add { name, frequency, start, color } => {
                let frequency = frequency.parse::<MedicationFrequency>()?;
                let start = start.as_deref().map(parse_date).transpose()?;
                cmd_med_add(db, &name, frequency, start, color, false)
            }
            MedCommands::Remove { name } => cmd_med_remove(db, &name, false),
            MedCommands::Log { kind, dose } => {
                cmd_med_log(db, kind, dose, today, clock_time(), false).map(drop)
            }
            MedCommands::List => cmd_med_list(db),
        },
        Some(Commands::Weight { command }) => match command {
            WeightCommands::Add { kg } => cmd_weight_add(db, kg, today, clock_time(), false).map(drop),
            WeightCommands::List => cmd_weight_list(db),
        },
        Some(Commands::Walk { command }) => match command {
            WalkCommands::Add { start, end, minutes } => {
                let (start, end) = (parse_time(&start)?, parse_time(&end)?);
                cmd_walk_add(db, start, end, minutes, today, false).map(drop)
            }
            WalkCommands::List => cmd_walk_list(db),
        },
        Some(Commands::Diary { command }) => match command {
            DiaryCommands::Add { text } => cmd_diary_add(db, &text, today, false),
            DiaryCommands::List => cmd_diary_list(db),
        },
        Some(Commands::Calendar { month }) => {
            let (year, month) = match month {
                Some(m) => {
                    let first = parse_date(&format!("{}-01", m.trim()))?;
                    (first.year(), first.month())
                }
                None => (today.year(), today.month()),
            };
            cmd_calendar(db, year, month, false).map(drop)
        }
        Some(Commands::Reset { force }) => cmd_reset(db, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "bananacare", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(config) {
                eprintln!("Error running TUI: {}", e);
            }
            Ok(())
        }
    }
}
