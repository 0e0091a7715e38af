pub mod config;
pub mod cursor;
pub mod dependencies;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod names;
pub mod persist;
pub mod progress;
pub mod references;
pub mod shell;
pub mod vfs;

pub use config::EngineSettings;
pub use cursor::{Cursor, CursorKind, FindMode};
pub use dependencies::DependencyMode;
pub use engine::{Engine, EngineState, EngineStatus, WaitMode};
pub use error::{IndexError, Result};
pub use frontend::BuildConfig;
pub use references::{Reference, ReferenceFlags};
pub use shell::Shell;
pub use vfs::{FileId, FileIds, Location};

#[cfg(test)]
#[path = "../tests/src/support.rs"]
pub(crate) mod test_support;
