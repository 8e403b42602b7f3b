use std::env;
use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::Duration;

use tern_bridge::BusLogLayer;
use tern_bridge::FeedUpdate;
use tern_bridge::ScriptedFeed;
use tern_core::Config;
use tern_core::ConfigError;
use tern_core::UiTheme;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

mod blocks;
mod stream;
mod theme;
mod ui;

const LOG_ENV: &str = "TERN_LOG";
const DEMO_TICK: Duration = Duration::from_millis(900);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("unsupported argument: {0}")]
    UnknownArgument(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open log file: {0}")]
    LogFile(#[from] io::Error),
    #[error("failed to install logger: {0}")]
    Logging(#[from] TryInitError),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunOptions {
    config: Option<PathBuf>,
    demo: bool,
    theme: Option<UiTheme>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Run(RunOptions),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match parse_args(env::args().skip(1).collect())? {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("tern {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Run(options) => run_shell(options),
    }
}

fn parse_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut options = RunOptions::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" | "help" => return Ok(Command::Help),
            "--version" | "-V" | "version" => return Ok(Command::Version),
            "run" if i == 0 => i += 1,
            "--demo" => {
                options.demo = true;
                i += 1;
            }
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(CliError::MissingValue("--config"));
                };
                options.config = Some(PathBuf::from(value));
                i += 2;
            }
            "--theme" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(CliError::MissingValue("--theme"));
                };
                options.theme = Some(value.parse()?);
                i += 2;
            }
            other => return Err(CliError::UnknownArgument(other.to_string())),
        }
    }
    Ok(Command::Run(options))
}

fn load_config(options: &RunOptions) -> Result<Config, CliError> {
    let mut config = match options.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if let Some(theme) = options.theme {
        config.ui.theme = theme;
    }
    Ok(config)
}

fn init_tracing(config: &Config, ui_logs: Sender<FeedUpdate>) -> Result<PathBuf, CliError> {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(BusLogLayer::new(ui_logs))
        .try_init()?;
    Ok(path)
}

fn run_shell(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&options)?;
    let (tx, rx) = mpsc::channel();
    let log_path = init_tracing(&config, tx.clone())?;
    info!(
        log = %log_path.display(),
        theme = config.ui.theme.label(),
        demo = options.demo,
        "starting tern"
    );

    let _feed = options
        .demo
        .then(|| ScriptedFeed::demo().spawn(tx.clone(), DEMO_TICK));
    drop(tx);

    ui::run(ui::App::new(config.ui), rx)?;
    info!("tern stopped");
    Ok(())
}

fn print_help() {
    println!("tern {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  tern [run] [--config PATH] [--demo] [--theme NAME]");
    println!("  tern --help");
    println!("  tern --version");
    println!();
    println!("Themes: classic, cyberpunk, neon-noir, solar-flare, forest-zen");
    println!("Logging: {LOG_ENV}=<filter> overrides the configured level");
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_with_defaults() {
        assert_eq!(
            parse_args(Vec::new()).expect("parse"),
            Command::Run(RunOptions::default())
        );
    }

    #[test]
    fn run_flags_are_collected() {
        let parsed = parse_args(args(&[
            "run",
            "--demo",
            "--theme",
            "neon-noir",
            "--config",
            "/tmp/tern.toml",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            Command::Run(RunOptions {
                config: Some(PathBuf::from("/tmp/tern.toml")),
                demo: true,
                theme: Some(UiTheme::NeonNoir),
            })
        );
    }

    #[test]
    fn help_and_version_win() {
        assert_eq!(parse_args(args(&["--demo", "-h"])).expect("parse"), Command::Help);
        assert_eq!(parse_args(args(&["--version"])).expect("parse"), Command::Version);
    }

    #[test]
    fn bad_arguments_are_reported() {
        let err = parse_args(args(&["--config"])).expect_err("missing value");
        assert_eq!(err.to_string(), "--config requires a value");

        let err = parse_args(args(&["--verbose"])).expect_err("unknown flag");
        assert_eq!(err.to_string(), "unsupported argument: --verbose");

        let err = parse_args(args(&["--theme", "mauve"])).expect_err("bad theme");
        assert!(err.to_string().contains("unknown theme `mauve`"));

        let err = parse_args(args(&["--demo", "run"])).expect_err("run must lead");
        assert_eq!(err.to_string(), "unsupported argument: run");
    }

    #[test]
    fn theme_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[ui]\ntheme = \"forest-zen\"\nlog_tail = 50").expect("write");

        let options = RunOptions {
            config: Some(file.path().to_path_buf()),
            demo: false,
            theme: Some(UiTheme::Cyberpunk),
        };
        let config = load_config(&options).expect("load");
        assert_eq!(config.ui.theme, UiTheme::Cyberpunk);
        assert_eq!(config.ui.log_tail, 50);
    }
}
