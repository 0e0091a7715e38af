use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cxx_indexer::config::find_project_config;
use cxx_indexer::{Engine, EngineSettings, Shell};

#[derive(Parser, Debug)]
#[command(name = "cxx-indexer", version, about)]
struct Args {
    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    log_file: Option<String>,

    /// Project configuration; defaults to the nearest `cxx-indexer.toml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restore a saved project state before reading commands.
    #[arg(long)]
    restore: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    let dir = dirs_or_tmp();
    dir.join("cxx-indexer.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".cxx-indexer");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn load_settings(explicit: Option<&Path>) -> (EngineSettings, Option<String>) {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::current_dir().ok().and_then(|cwd| find_project_config(&cwd)),
    };
    let Some(path) = path else {
        return (EngineSettings::default(), None);
    };
    match EngineSettings::from_toml_file(&path) {
        Ok(settings) => (settings, None),
        Err(err) => (EngineSettings::default(), Some(format!("ignoring {}: {err}", path.display()))),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    // Logging is not up yet; report config problems once it is.
    let (settings, config_warning) = load_settings(args.config.as_deref());

    let level = if args.verbose {
        "debug"
    } else {
        settings.logging.level.as_filter()
    };
    let stderr_filter = EnvFilter::new(format!("cxx_indexer={level}"));
    let file_filter = EnvFilter::new(format!("cxx_indexer={level}"));

    let log_path = args.log_file.as_ref().map(PathBuf::from).unwrap_or_else(default_log_path);

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path.file_name().unwrap_or(std::ffi::OsStr::new("cxx-indexer.log")),
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(false)
        .with_filter(file_filter);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();

    info!("Starting cxx-indexer v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());
    if let Some(warning) = config_warning {
        warn!("{warning}");
    }

    let engine = match Engine::new(&settings) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            error!("failed to start indexer: {err}");
            std::process::exit(1);
        },
    };

    if let Some(path) = &args.restore {
        match engine.restore(path) {
            Ok(true) => info!("restored project state from {}", path.display()),
            Ok(false) => warn!("project state in {} was rejected", path.display()),
            Err(err) => warn!("{err}"),
        }
    }

    let shell = Shell::new(engine, settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("failed to read command: {err}");
                break;
            },
        };
        let Some(response) = shell.execute(&line).await else {
            continue;
        };
        let mut block = response.join("\n");
        block.push('\n');
        if let Err(err) = stdout.write_all(block.as_bytes()).await {
            error!("failed to write response: {err}");
            break;
        }
        if let Err(err) = stdout.flush().await {
            error!("failed to flush response: {err}");
            break;
        }
    }

    info!("cxx-indexer stopped");
}
