//! Line-oriented command front door. Each input line is one command; each
//! response is a block of lines ending with [`SENTINEL`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::EngineSettings;
use crate::dependencies::DependencyMode;
use crate::engine::{Engine, EngineState, WaitMode};
use crate::error::{IndexError, Result};
use crate::frontend::BuildConfig;
use crate::references::{ReferenceFlags, SENTINEL, format_references};
use crate::vfs::normalized_path;

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>.+?):(?P<line>\d+):(?P<column>\d+):?$").unwrap_or_else(|err| panic!("bad location regex: {err}"))
});

/// `path:line:column`, columns 1-based.
pub fn parse_location(text: &str) -> Result<(PathBuf, u32, u32)> {
    let invalid = || IndexError::InvalidLocation(text.to_string());
    let captures = LOCATION_RE.captures(text.trim()).ok_or_else(invalid)?;
    let line: u32 = captures["line"].parse().map_err(|_| invalid())?;
    let column: u32 = captures["column"].parse().map_err(|_| invalid())?;
    if line == 0 || column == 0 {
        return Err(invalid());
    }
    Ok((PathBuf::from(&captures["path"]), line, column))
}

#[derive(Parser, Debug)]
#[command(name = "", no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index one source file.
    Index {
        path: PathBuf,
        #[arg(short = 'I', value_name = "DIR")]
        include: Vec<PathBuf>,
        #[arg(short = 'D', value_name = "DEFINE")]
        define: Vec<String>,
    },
    /// Index every source file under a directory.
    IndexDir {
        dir: PathBuf,
        #[arg(short = 'I', value_name = "DIR")]
        include: Vec<PathBuf>,
        #[arg(short = 'D', value_name = "DEFINE")]
        define: Vec<String>,
    },
    Remove {
        path: PathBuf,
    },
    Cursor {
        location: String,
    },
    References {
        location: String,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        virtuals: bool,
        #[arg(long)]
        no_context: bool,
        #[arg(long)]
        filter: Vec<PathBuf>,
    },
    List {
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long)]
        filter: Vec<PathBuf>,
    },
    Find {
        name: String,
        #[arg(long)]
        filter: Vec<PathBuf>,
    },
    Cursors {
        path: PathBuf,
    },
    Files {
        #[arg(long)]
        headers: bool,
        #[arg(long)]
        sources: bool,
    },
    Deps {
        path: PathBuf,
        /// Files depending on `path` instead of files `path` depends on.
        #[arg(long)]
        reverse: bool,
    },
    Dump {
        path: PathBuf,
    },
    Status,
    Wait,
    Save {
        file: Option<PathBuf>,
    },
    Restore {
        file: Option<PathBuf>,
    },
}

pub struct Shell {
    engine: Arc<Engine>,
    settings: EngineSettings,
}

impl Shell {
    pub fn new(
        engine: Arc<Engine>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            engine,
            settings,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Runs one command line and returns its response, sentinel included.
    /// Blank lines produce no response.
    pub async fn execute(
        &self,
        line: &str,
    ) -> Option<Vec<String>> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        let mut lines = match CommandLine::try_parse_from(&words) {
            Ok(parsed) => self.run(parsed.command).await,
            Err(err) => err.render().to_string().lines().map(str::to_string).collect(),
        };
        if lines.last().map(String::as_str) != Some(SENTINEL) {
            lines.push(SENTINEL.to_string());
        }
        Some(lines)
    }

    async fn run(
        &self,
        command: Command,
    ) -> Vec<String> {
        match command {
            Command::Index {
                path,
                include,
                define,
            } => {
                let config = build_config(include, define);
                self.engine.submit(&path, vec![config]);
                Vec::new()
            },
            Command::IndexDir {
                dir,
                include,
                define,
            } => {
                let config = build_config(include, define);
                let sources = self.sources_under(&dir);
                for source in &sources {
                    self.engine.submit(source, vec![config.clone()]);
                }
                vec![format!("queued {} files", sources.len())]
            },
            Command::Remove {
                path,
            } => {
                let removed = self.blocking(move |engine| engine.remove(&path)).await;
                if removed == Some(true) {
                    Vec::new()
                } else {
                    vec!["not indexed".to_string()]
                }
            },
            Command::Cursor {
                location,
            } => match parse_location(&location) {
                Ok((path, line, column)) => self
                    .blocking(move |engine| {
                        let location = engine.location(&path, line, column);
                        engine.cursor(&location).map(|cursor| cursor.format(engine.file_ids()))
                    })
                    .await
                    .flatten()
                    .into_iter()
                    .collect(),
                Err(err) => vec![err.to_string()],
            },
            Command::References {
                location,
                all,
                virtuals,
                no_context,
                filter,
            } => {
                let flags = ReferenceFlags {
                    all_references: all,
                    find_virtuals: virtuals,
                    no_context,
                };
                match parse_location(&location) {
                    Ok((path, line, column)) => self
                        .blocking(move |engine| {
                            let location = engine.location(&path, line, column);
                            format_references(&engine.references(&location, flags, &filter), flags)
                        })
                        .await
                        .unwrap_or_default(),
                    Err(err) => vec![err.to_string()],
                }
            },
            Command::List {
                prefix,
                filter,
            } => self
                .blocking(move |engine| engine.list_symbols(&prefix, &filter).into_iter().collect())
                .await
                .unwrap_or_default(),
            Command::Find {
                name,
                filter,
            } => self
                .blocking(move |engine| {
                    engine
                        .find_cursors(&name, &filter)
                        .iter()
                        .map(|cursor| format!("{}\t{}", cursor.format(engine.file_ids()), cursor.symbol_name))
                        .collect()
                })
                .await
                .unwrap_or_default(),
            Command::Cursors {
                path,
            } => self
                .blocking(move |engine| {
                    engine
                        .cursors(&path)
                        .iter()
                        .map(|cursor| format!("{}\t{}", cursor.format(engine.file_ids()), cursor.symbol_name))
                        .collect()
                })
                .await
                .unwrap_or_default(),
            Command::Files {
                headers,
                sources,
            } => {
                let (headers, sources) = if headers || sources {
                    (headers, sources)
                } else {
                    (true, true)
                };
                self.blocking(move |engine| display_paths(engine.files(headers, sources)))
                    .await
                    .unwrap_or_default()
            },
            Command::Deps {
                path,
                reverse,
            } => {
                let mode = if reverse {
                    DependencyMode::WhatDependsOnThis
                } else {
                    DependencyMode::WhatThisDependsOn
                };
                self.blocking(move |engine| display_paths(engine.dependencies(&path, mode)))
                    .await
                    .unwrap_or_default()
            },
            Command::Dump {
                path,
            } => self.blocking(move |engine| engine.dump(&path)).await.unwrap_or_default(),
            Command::Status => self.engine.status().lines(),
            Command::Wait => {
                self.blocking(|engine| engine.wait_for(WaitMode::AtLeast, EngineState::Idle)).await;
                vec![format!("state: {}", self.engine.state())]
            },
            Command::Save {
                file,
            } => match self.state_file(file) {
                Some(path) => match self.blocking(move |engine| engine.save(&path)).await {
                    Some(Ok(())) => Vec::new(),
                    Some(Err(err)) => vec![err.to_string()],
                    None => vec!["save failed".to_string()],
                },
                None => vec!["no state file given or configured".to_string()],
            },
            Command::Restore {
                file,
            } => match self.state_file(file) {
                Some(path) => match self.blocking(move |engine| engine.restore(&path)).await {
                    Some(Ok(true)) => Vec::new(),
                    Some(Ok(false)) => vec!["project state rejected".to_string()],
                    Some(Err(err)) => vec![err.to_string()],
                    None => vec!["restore failed".to_string()],
                },
                None => vec!["no state file given or configured".to_string()],
            },
        }
    }

    /// Runs a query that may wait on the engine off the async runtime.
    async fn blocking<T, F>(
        &self,
        query: F,
    ) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&Engine) -> T + Send + 'static,
    {
        let engine = self.engine.clone();
        match tokio::task::spawn_blocking(move || query(&engine)).await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!("query task failed: {err}");
                None
            },
        }
    }

    fn state_file(
        &self,
        explicit: Option<PathBuf>,
    ) -> Option<PathBuf> {
        explicit.or_else(|| self.settings.persistence.state_file.clone())
    }

    fn sources_under(
        &self,
        dir: &Path,
    ) -> Vec<PathBuf> {
        let sources: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.settings.front_end.is_source(path))
            .collect();
        debug!("found {} sources under {}", sources.len(), dir.display());
        sources
    }
}

fn build_config(
    include: Vec<PathBuf>,
    define: Vec<String>,
) -> BuildConfig {
    BuildConfig::new(include.iter().map(|dir| normalized_path(dir)).collect(), define)
}

fn display_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths.into_iter().map(|path| path.display().to_string()).collect()
}

#[cfg(test)]
#[path = "../tests/src/shell_tests.rs"]
mod tests;
