//! facetouch CLI - Command-line front end for the face-touch habit monitor
//!
//! Commands:
//! - replay: Run recorded detector frames through the proximity state machine
//! - stats: Show today / weekly / monthly statistics
//! - meditate: Record a completed meditation
//! - settings: Show or update habit settings
//! - export / import: Portable statistics documents

use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use facetouch::clock::{self, Clock, ManualClock, SystemClock};
use facetouch::detection::{
    AlertEvent, DetectionZone, Frame, ProximityConfig, ProximityHandlers, ProximityMachine,
};
use facetouch::meditation::{self, MEDITATIONS};
use facetouch::stats::{DailyStats, HabitSettingsUpdate, HabitTracker};
use facetouch::store::FileStore;
use facetouch::{FrameError, ImportError, VERSION};

/// facetouch - Detect face touches and track the habit over time
#[derive(Parser)]
#[command(name = "facetouch")]
#[command(version = VERSION)]
#[command(about = "Face-touch detection and habit statistics", long_about = None)]
struct Cli {
    /// Directory holding the statistics document
    #[arg(long, global = true, default_value = ".facetouch")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay NDJSON detector frames and record every alert
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Proximity configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override sensitivity (0.0 - 1.0)
        #[arg(long)]
        sensitivity: Option<f64>,

        /// Override enabled zones (comma separated, e.g. "eyes,nose"; "hair" and "face" select groups)
        #[arg(long, value_delimiter = ',')]
        zones: Vec<String>,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Show statistics
    Stats {
        #[arg(value_enum, default_value = "today")]
        view: StatsView,

        /// Year for the monthly view (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month for the monthly view, 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a completed meditation
    Meditate {
        /// Minutes meditated
        #[arg(long, conflicts_with = "exercise")]
        minutes: Option<u32>,

        /// Catalog exercise id (defaults to the one nearest the configured duration)
        #[arg(long)]
        exercise: Option<String>,

        /// List the exercise catalog instead of recording
        #[arg(long)]
        list: bool,
    },

    /// Show or update habit settings
    Settings {
        /// Touches between meditation recommendations
        #[arg(long)]
        threshold: Option<u32>,

        /// Daily touch goal
        #[arg(long)]
        goal: Option<u32>,

        /// Default meditation length in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Enable or disable meditation reminders
        #[arg(long)]
        reminders: Option<bool>,

        /// Minutes between recommendations
        #[arg(long)]
        cooldown: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export statistics
    Export {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Import a previously exported document, replacing current statistics
    Import {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum StatsView {
    /// Today's live statistics
    Today,
    /// The last seven days
    Week,
    /// One calendar month up to today
    Month,
    /// Lifetime progress
    Progress,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FacetouchCliError> {
    let store = FileStore::new(&cli.data_dir);

    match cli.command {
        Commands::Replay {
            input,
            config,
            sensitivity,
            zones,
            flush,
        } => cmd_replay(store, &input, config.as_deref(), sensitivity, &zones, flush),

        Commands::Stats {
            view,
            year,
            month,
            json,
        } => cmd_stats(store, view, year, month, json),

        Commands::Meditate {
            minutes,
            exercise,
            list,
        } => cmd_meditate(store, minutes, exercise.as_deref(), list),

        Commands::Settings {
            threshold,
            goal,
            duration,
            reminders,
            cooldown,
            json,
        } => {
            let update = HabitSettingsUpdate {
                touch_threshold_for_meditation: threshold,
                daily_touch_goal: goal,
                meditation_duration: duration,
                enable_meditation_reminder: reminders,
                meditation_cooldown_minutes: cooldown,
            };
            cmd_settings(store, update, json)
        }

        Commands::Export { output } => cmd_export(store, &output),

        Commands::Import { input } => cmd_import(store, &input),
    }
}

fn cmd_replay(
    store: FileStore,
    input: &Path,
    config_path: Option<&Path>,
    sensitivity: Option<f64>,
    zones: &[String],
    flush: bool,
) -> Result<(), FacetouchCliError> {
    let mut config = match config_path {
        Some(path) => ProximityConfig::from_json(&fs::read_to_string(path)?)?,
        None => ProximityConfig::default(),
    };
    if let Some(sensitivity) = sensitivity {
        config.sensitivity = sensitivity;
    }
    if !zones.is_empty() {
        let mut enabled = Vec::new();
        for name in zones {
            let group = DetectionZone::parse_group(name)
                .ok_or_else(|| FacetouchCliError::UnknownZone(name.clone()))?;
            for zone in group {
                if !enabled.contains(&zone) {
                    enabled.push(zone);
                }
            }
        }
        config.enabled_zones = enabled;
    }

    let frames = Frame::parse_ndjson(&read_input(input)?)?;
    let Some(first) = frames.first() else {
        return Err(FacetouchCliError::NoFrames);
    };

    // Recorded timestamps drive both engines; days resolve in the local offset
    let clock = ManualClock::with_offset(first.timestamp, SystemClock.offset_at(first.timestamp));
    let mut tracker = HabitTracker::new(store, clock.clone());

    let alerts: Rc<RefCell<Vec<AlertEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&alerts);
    let handlers = ProximityHandlers::new().on_alert(move |alert| sink.borrow_mut().push(*alert));
    let mut machine = ProximityMachine::new(config, clock.clone(), handlers);

    let mut stdout = io::stdout();
    let mut alert_count = 0usize;

    for frame in &frames {
        clock.set(frame.timestamp);
        machine.update(&frame.hands, frame.head.as_ref(), frame.face.as_ref());

        let fired: Vec<AlertEvent> = alerts.borrow_mut().drain(..).collect();
        for alert in fired {
            let touch = tracker.record_alert(&alert);
            let recommend = tracker.should_recommend_meditation();
            if recommend {
                tracker.set_meditation_recommended();
            }
            alert_count += 1;

            let record = ReplayRecord {
                id: touch.id,
                timestamp: touch.timestamp,
                duration_ms: touch.duration,
                zone: touch.zone,
                touches_today: tracker.get_today_touch_count(),
                recommend_meditation: recommend,
            };
            writeln!(stdout, "{}", serde_json::to_string(&record)?)?;
            if flush {
                stdout.flush()?;
            }
        }
    }

    stdout.flush()?;
    log::info!("replayed {} frames, {} alerts", frames.len(), alert_count);
    Ok(())
}

fn cmd_stats(
    store: FileStore,
    view: StatsView,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<(), FacetouchCliError> {
    let mut tracker = HabitTracker::new(store, SystemClock);
    let goal = tracker.get_settings().daily_touch_goal;

    match view {
        StatsView::Today => {
            let today = tracker.get_today_stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&today)?);
            } else {
                print_day(&today, goal);
                if let Some(hour) = today.peak_hour() {
                    println!("Peak hour: {:02}:00", hour);
                }
            }
        }
        StatsView::Week => {
            let week = tracker.get_weekly_stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&week)?);
            } else {
                week.iter().for_each(|day| print_day(day, goal));
            }
        }
        StatsView::Month => {
            let today = clock::today(tracker.clock());
            let (year, month) = (year.unwrap_or(today.year()), month.unwrap_or(today.month()));
            let days = tracker.get_monthly_stats(year, month);
            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                days.values().for_each(|day| print_day(day, goal));
            }
        }
        StatsView::Progress => {
            let progress = tracker.get_progress();
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                println!("Tracking since:  {}", progress.start_date);
                println!("Current streak:  {} days", progress.current_streak);
                println!("Longest streak:  {} days", progress.longest_streak);
                println!(
                    "Meditation:      {} min over {} sessions",
                    progress.total_meditation_minutes, progress.total_meditation_sessions
                );
            }
        }
    }

    Ok(())
}

fn print_day(day: &DailyStats, goal: u32) {
    let status = if day.touch_count <= goal { "[OK]" } else { "[OVER]" };
    println!(
        "{} {:>6} {:>4} touches  {:>3} min meditation",
        day.date, status, day.touch_count, day.meditation_minutes
    );
}

fn cmd_meditate(
    store: FileStore,
    minutes: Option<u32>,
    exercise: Option<&str>,
    list: bool,
) -> Result<(), FacetouchCliError> {
    if list {
        for m in &MEDITATIONS {
            let p = m.pattern;
            println!(
                "{:<16} {:>4}s  {}-{}-{} x{}  {}",
                m.id, m.duration, p.inhale, p.hold, p.exhale, p.cycles, m.description
            );
        }
        return Ok(());
    }

    let mut tracker = HabitTracker::new(store, SystemClock);
    let minutes = match (minutes, exercise) {
        (Some(minutes), _) => minutes,
        (None, Some(id)) => meditation::meditation_by_id(id)
            .map(meditation::credited_minutes)
            .ok_or_else(|| FacetouchCliError::UnknownExercise(id.to_string()))?,
        (None, None) => {
            let duration = tracker.get_settings().meditation_duration;
            meditation::credited_minutes(meditation::closest_to(duration))
        }
    };

    tracker.record_meditation(minutes);
    println!("{}", serde_json::to_string_pretty(&tracker.get_progress())?);
    Ok(())
}

fn cmd_settings(
    store: FileStore,
    update: HabitSettingsUpdate,
    json: bool,
) -> Result<(), FacetouchCliError> {
    let mut tracker = HabitTracker::new(store, SystemClock);
    if update != HabitSettingsUpdate::default() {
        tracker.update_settings(update);
    }

    let settings = tracker.get_settings();
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("Touch threshold for meditation: {}", settings.touch_threshold_for_meditation);
        println!("Daily touch goal:               {}", settings.daily_touch_goal);
        println!("Meditation duration:            {}s", settings.meditation_duration);
        println!("Meditation reminders:           {}", settings.enable_meditation_reminder);
        println!("Meditation cooldown:            {} min", settings.meditation_cooldown_minutes);
    }
    Ok(())
}

fn cmd_export(store: FileStore, output: &Path) -> Result<(), FacetouchCliError> {
    let mut tracker = HabitTracker::new(store, SystemClock);
    let data = tracker.export_json()?;

    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn cmd_import(store: FileStore, input: &Path) -> Result<(), FacetouchCliError> {
    let doc: serde_json::Value = serde_json::from_str(&read_input(input)?)?;
    let mut tracker = HabitTracker::new(store, SystemClock);
    let summary = tracker.try_import(&doc)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn read_input(input: &Path) -> Result<String, FacetouchCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(FacetouchCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayRecord {
    id: String,
    timestamp: i64,
    duration_ms: u64,
    zone: Option<DetectionZone>,
    touches_today: usize,
    recommend_meditation: bool,
}

// Error types

#[derive(Debug)]
enum FacetouchCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Frame(FrameError),
    Import(ImportError),
    UnknownZone(String),
    UnknownExercise(String),
    NoInput,
    NoFrames,
}

impl From<io::Error> for FacetouchCliError {
    fn from(e: io::Error) -> Self {
        FacetouchCliError::Io(e)
    }
}

impl From<serde_json::Error> for FacetouchCliError {
    fn from(e: serde_json::Error) -> Self {
        FacetouchCliError::Json(e)
    }
}

impl From<FrameError> for FacetouchCliError {
    fn from(e: FrameError) -> Self {
        FacetouchCliError::Frame(e)
    }
}

impl From<ImportError> for FacetouchCliError {
    fn from(e: ImportError) -> Self {
        FacetouchCliError::Import(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FacetouchCliError> for CliError {
    fn from(e: FacetouchCliError) -> Self {
        match e {
            FacetouchCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FacetouchCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FacetouchCliError::Frame(e) => CliError {
                code: "FRAME_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Each line must be a {timestamp, hands, head, face} object".to_string()),
            },
            FacetouchCliError::Import(e) => CliError {
                code: "IMPORT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Import a file produced by 'facetouch export'".to_string()),
            },
            FacetouchCliError::UnknownZone(name) => CliError {
                code: "UNKNOWN_ZONE".to_string(),
                message: format!("Unknown detection zone: {}", name),
                hint: Some(format!(
                    "Valid zones: fullFace, hair, face, {}",
                    DetectionZone::SPECIFIC.map(|z| z.as_str()).join(", ")
                )),
            },
            FacetouchCliError::UnknownExercise(id) => CliError {
                code: "UNKNOWN_EXERCISE".to_string(),
                message: format!("Unknown meditation exercise: {}", id),
                hint: Some("Run 'facetouch meditate --list'".to_string()),
            },
            FacetouchCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal".to_string(),
                hint: Some("Pipe input into stdin or pass --input <file>".to_string()),
            },
            FacetouchCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
        }
    }
}
