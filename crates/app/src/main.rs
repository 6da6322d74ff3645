use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use course_core::model::{Catalog, LectureId, PlaybackState, PlayerLifecycle};
use services::{CourseOverview, EngineConfig, ProgressTrackingEngine, SimulatedPlayerFactory};
use storage::{Storage, StorageKeys};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidInterval { raw: String },
    InvalidDuration { raw: String },
    InvalidSpeed { raw: String },
    InvalidPercent { raw: String },
    InvalidLectureId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidInterval { raw } => write!(f, "invalid --interval value: {raw}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::InvalidSpeed { raw } => write!(f, "invalid --speed value: {raw}"),
            ArgsError::InvalidPercent { raw } => write!(f, "invalid --pause-at value: {raw}"),
            ArgsError::InvalidLectureId { raw } => write!(f, "invalid --lecture value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
struct NotAuthorized;

impl fmt::Display for NotAuthorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "course access has not been granted yet; sign up first with `app authorize`"
        )
    }
}

impl std::error::Error for NotAuthorized {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- status    [common options]");
    eprintln!("  cargo run -p app -- authorize [common options]");
    eprintln!("  cargo run -p app -- watch     [common options] [--lecture <id>]... [--duration <secs>]");
    eprintln!("                                [--speed <factor>] [--pause-at <percent>]");
    eprintln!("  cargo run -p app -- reset     [common options]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>      default sqlite:course.sqlite3");
    eprintln!("  --catalog <path>      JSON array of {{id, title, description}}; default built-in course");
    eprintln!("  --interval <secs>     progress sampling interval, default 5");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_CATALOG, COURSE_SAMPLE_INTERVAL_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Authorize,
    Watch,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "authorize" => Some(Self::Authorize),
            "watch" => Some(Self::Watch),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct WatchArgs {
    lectures: Vec<LectureId>,
    duration_secs: f64,
    speed: f64,
    pause_at: Option<u8>,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            lectures: Vec::new(),
            duration_secs: 600.0,
            speed: 60.0,
            pause_at: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    catalog_path: Option<String>,
    sample_interval: Duration,
    watch: WatchArgs,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://course.sqlite3".into(), normalize_sqlite_url);
        let mut catalog_path = std::env::var("COURSE_CATALOG")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut sample_interval = std::env::var("COURSE_SAMPLE_INTERVAL_SECS")
            .ok()
            .and_then(|value| parse_interval(&value).ok())
            .unwrap_or(EngineConfig::DEFAULT_SAMPLE_INTERVAL);
        let mut watch = WatchArgs::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => {
                    catalog_path = Some(require_value(args, "--catalog")?);
                }
                "--interval" => {
                    let value = require_value(args, "--interval")?;
                    sample_interval = parse_interval(&value)?;
                }
                "--lecture" if cmd == Command::Watch => {
                    let value = require_value(args, "--lecture")?;
                    let id = LectureId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidLectureId { raw: value })?;
                    watch.lectures.push(id);
                }
                "--duration" if cmd == Command::Watch => {
                    let value = require_value(args, "--duration")?;
                    watch.duration_secs = parse_positive(&value)
                        .ok_or(ArgsError::InvalidDuration { raw: value })?;
                }
                "--speed" if cmd == Command::Watch => {
                    let value = require_value(args, "--speed")?;
                    watch.speed =
                        parse_positive(&value).ok_or(ArgsError::InvalidSpeed { raw: value })?;
                }
                "--pause-at" if cmd == Command::Watch => {
                    let value = require_value(args, "--pause-at")?;
                    let pct = value
                        .parse::<u8>()
                        .ok()
                        .filter(|pct| *pct <= 100)
                        .ok_or(ArgsError::InvalidPercent { raw: value })?;
                    watch.pause_at = Some(pct);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog_path,
            sample_interval,
            watch,
        })
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ArgsError> {
    parse_positive(raw)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| ArgsError::InvalidInterval {
            raw: raw.to_string(),
        })
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn load_catalog(path: Option<&str>) -> Result<Catalog, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Catalog::opentelemetry_course());
    };
    let raw = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&raw)?;
    info!(path, lectures = catalog.len(), "loaded catalog");
    Ok(catalog)
}

fn print_overview(overview: &CourseOverview) {
    println!(
        "{}/{} lectures complete",
        overview.completed, overview.total
    );
    if overview.awaiting_first_selection() {
        println!("Select a video to start learning.");
    }
    for (index, row) in overview.lectures.iter().enumerate() {
        let marker = if row.is_active { '>' } else { ' ' };
        println!(
            "{marker} {:>2}. [{:>3}%] {}  {}",
            index + 1,
            row.percent(),
            row.lecture.title(),
            row.label()
        );
    }
}

/// Wait until the lifecycle subscription has delivered the final event.
async fn settle(engine: &ProgressTrackingEngine, expected: PlaybackState) {
    for _ in 0..100 {
        if engine.playback_state().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    debug!(%expected, "player did not settle in time");
}

async fn watch(
    catalog: Catalog,
    storage: &Storage,
    sample_interval: Duration,
    args: WatchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let factory = SimulatedPlayerFactory::new();
    let controls = factory.controls();
    let config = EngineConfig::default().with_sample_interval(sample_interval);
    let lectures = if args.lectures.is_empty() {
        vec![catalog.first().id().clone()]
    } else {
        args.lectures
    };

    let engine =
        ProgressTrackingEngine::start(catalog, storage.progress_store(), Arc::new(factory), config)
            .await;

    for lecture in &lectures {
        engine.select_lecture(lecture).await?;
        info!(lecture = %lecture, speed = args.speed, "playing");

        let last = controls
            .play_through(
                args.duration_secs,
                args.speed,
                Duration::from_millis(250),
                args.pause_at,
            )
            .await;
        settle(&engine, PlaybackState::from(last)).await;

        if last == PlayerLifecycle::Paused {
            break;
        }
    }

    print_overview(&engine.overview().await);
    engine.shutdown().await;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show course status when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Status,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Status,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url, StorageKeys::default()).await?;
    let gate = storage.authorization_gate();

    if cmd == Command::Authorize {
        gate.grant().await?;
        println!("Course access granted.");
        return Ok(());
    }

    if !gate.is_authorized().await? {
        return Err(NotAuthorized.into());
    }

    let catalog = load_catalog(parsed.catalog_path.as_deref())?;

    match cmd {
        Command::Status => {
            let engine = ProgressTrackingEngine::start(
                catalog,
                storage.progress_store(),
                Arc::new(SimulatedPlayerFactory::new()),
                EngineConfig::default(),
            )
            .await;
            print_overview(&engine.overview().await);
            Ok(())
        }
        Command::Watch => watch(catalog, &storage, parsed.sample_interval, parsed.watch).await,
        Command::Reset => {
            storage.progress_store().clear().await?;
            println!("Progress cleared.");
            Ok(())
        }
        Command::Authorize => Ok(()),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore a second init (e.g. when a test harness already installed one).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(cmd, &mut iter)
    }

    #[test]
    fn subcommands_are_recognized() {
        assert_eq!(Command::from_arg("watch"), Some(Command::Watch));
        assert_eq!(Command::from_arg("status"), Some(Command::Status));
        assert_eq!(Command::from_arg("play"), None);
    }

    #[test]
    fn watch_flags_are_parsed() {
        let args = parse(
            Command::Watch,
            &[
                "--lecture", "l1", "--lecture", "l2", "--speed", "120", "--pause-at", "40",
                "--interval", "0.5",
            ],
        )
        .unwrap();
        assert_eq!(args.watch.lectures.len(), 2);
        assert!((args.watch.speed - 120.0).abs() < f64::EPSILON);
        assert_eq!(args.watch.pause_at, Some(40));
        assert_eq!(args.sample_interval, Duration::from_millis(500));
    }

    #[test]
    fn watch_flags_are_rejected_elsewhere() {
        let err = parse(Command::Status, &["--lecture", "l1"]).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(arg) if arg == "--lecture"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            parse(Command::Watch, &["--pause-at", "150"]),
            Err(ArgsError::InvalidPercent { .. })
        ));
        assert!(matches!(
            parse(Command::Status, &["--interval", "0"]),
            Err(ArgsError::InvalidInterval { .. })
        ));
        assert!(matches!(
            parse(Command::Status, &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        let url = normalize_sqlite_url("sqlite:data/course.sqlite3".into());
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("data/course.sqlite3"));
    }
}
