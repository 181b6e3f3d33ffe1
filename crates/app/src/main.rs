use std::fmt;

use services::{AppServices, Clock};
use shapeville_core::curriculum::Curriculum;
use shapeville_core::model::ModuleId;
use shapeville_core::settings::ExerciseSettingsDraft;

mod problems;
mod shell;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingModule { command: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidModule { raw: String },
    InvalidNumber { source: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingModule { command } => write!(f, "{command} requires a module"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidModule { raw } => write!(f, "unknown module: {raw}"),
            ArgsError::InvalidNumber { source, raw } => {
                write!(f, "invalid {source} value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(source: &'static str, raw: &str) -> Result<u32, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        source,
        raw: raw.to_string(),
    })
}

fn parse_module(raw: String) -> Result<ModuleId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidModule { raw })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play <module>   [options]");
    eprintln!("  cargo run -p app -- status [--json] [options]");
    eprintln!("  cargo run -p app -- reset <module>  [options]");
    eprintln!("  cargo run -p app -- modules");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>        default sqlite:shapeville.sqlite3");
    eprintln!("  --max-attempts <n>       attempts per question (1-10, default 3)");
    eprintln!("  --time-budget <secs>     countdown for timed modules");
    eprintln!("  --no-timer               disable countdowns");
    eprintln!();
    eprintln!("Modules:");
    eprintln!("  shapes_2d, shapes_3d, angles, area, circle, compound, sectors");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SHAPEVILLE_DB_URL, SHAPEVILLE_MAX_ATTEMPTS, SHAPEVILLE_TIME_BUDGET,");
    eprintln!("  SHAPEVILLE_NO_TIMER, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play(ModuleId),
    Status { json: bool },
    Reset(ModuleId),
    Modules,
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    settings: ExerciseSettingsDraft,
}

impl Args {
    /// Environment first, then flags.
    fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env("SHAPEVILLE_DB_URL")
            .map_or_else(|| "sqlite://shapeville.sqlite3".into(), normalize_sqlite_url);
        let mut settings = ExerciseSettingsDraft::new();
        if let Some(raw) = env("SHAPEVILLE_MAX_ATTEMPTS") {
            settings.max_attempts = Some(parse_number("SHAPEVILLE_MAX_ATTEMPTS", &raw)?);
        }
        if let Some(raw) = env("SHAPEVILLE_TIME_BUDGET") {
            settings.time_budget_secs = Some(parse_number("SHAPEVILLE_TIME_BUDGET", &raw)?);
        }
        if env("SHAPEVILLE_NO_TIMER").is_some_and(|v| is_truthy(&v)) {
            settings.timers_enabled = Some(false);
        }

        let mut args = argv.into_iter();
        let mut command_name: Option<String> = None;
        let mut module: Option<String> = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--max-attempts" => {
                    let value = require_value(&mut args, "--max-attempts")?;
                    settings.max_attempts = Some(parse_number("--max-attempts", &value)?);
                }
                "--time-budget" => {
                    let value = require_value(&mut args, "--time-budget")?;
                    settings.time_budget_secs = Some(parse_number("--time-budget", &value)?);
                }
                "--no-timer" => settings.timers_enabled = Some(false),
                "--json" => json = true,
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if command_name.is_none() => command_name = Some(arg),
                _ if module.is_none() => module = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match command_name.as_deref() {
            None => return Ok(None),
            Some("play") => Command::Play(parse_module(
                module.take().ok_or(ArgsError::MissingModule { command: "play" })?,
            )?),
            Some("reset") => Command::Reset(parse_module(
                module
                    .take()
                    .ok_or(ArgsError::MissingModule { command: "reset" })?,
            )?),
            Some("status") => Command::Status { json },
            Some("modules") => Command::Modules,
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        if let Some(extra) = module {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            command,
            db_url,
            settings,
        }))
    }
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    let Some(args) = parsed else {
        print_usage();
        return Ok(());
    };

    if args.command == Command::Modules {
        shell::print_modules(&Curriculum::standard());
        return Ok(());
    }

    let settings = args.settings.validate()?;
    // Open + migrate SQLite here so core/services stay free of file handling.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), settings).await?;
    log::debug!("using database {}", args.db_url);

    match args.command {
        Command::Play(module) => shell::play(&services, module).await,
        Command::Status { json } => shell::print_status(&services, json),
        Command::Reset(module) => {
            let cleared = services.exercises().reset_module(module).await?;
            println!("{module}: cleared {cleared} completed exercise(s)");
            Ok(())
        }
        Command::Modules => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| (*a).to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_play_with_flags() {
        let args = Args::parse(
            argv(&["play", "sectors", "--max-attempts", "5", "--no-timer"]),
            no_env,
        )
        .unwrap()
        .unwrap();
        assert_eq!(args.command, Command::Play(ModuleId::Sectors));
        assert_eq!(args.settings.max_attempts, Some(5));
        assert_eq!(args.settings.timers_enabled, Some(false));
        assert!(args.db_url.starts_with("sqlite://"));
    }

    #[test]
    fn flags_override_environment() {
        let env = |key: &str| match key {
            "SHAPEVILLE_TIME_BUDGET" => Some("90".to_string()),
            "SHAPEVILLE_DB_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        };
        let args = Args::parse(argv(&["status", "--time-budget", "30", "--json"]), env)
            .unwrap()
            .unwrap();
        assert_eq!(args.command, Command::Status { json: true });
        assert_eq!(args.settings.time_budget_secs, Some(30));
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn reports_bad_arguments() {
        assert!(matches!(
            Args::parse(argv(&["play"]), no_env),
            Err(ArgsError::MissingModule { command: "play" })
        ));
        assert!(matches!(
            Args::parse(argv(&["reset", "triangles"]), no_env),
            Err(ArgsError::InvalidModule { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["status", "--max-attempts", "many"]), no_env),
            Err(ArgsError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["dance"]), no_env),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(Args::parse(Vec::new(), no_env).unwrap().is_none());
    }

    #[test]
    fn module_names_accept_dashes() {
        let args = Args::parse(argv(&["play", "shapes-2d"]), no_env)
            .unwrap()
            .unwrap();
        assert_eq!(args.command, Command::Play(ModuleId::Shapes2D));
    }
}
