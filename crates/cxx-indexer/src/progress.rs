//! Advisory progress lines for an indexing batch.
//!
//! ```text
//! [ 50%] 1/2 14:03:27 /src/a.cpp, Files: 3
//! Parsed 2 files in 41 ms
//! ```

use std::fmt::Display;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Local, TimeZone};

#[derive(Debug)]
pub struct BatchProgress {
    started: Instant,
    taken: usize,
    every: usize,
}

impl BatchProgress {
    pub fn start(every: usize) -> Self {
        Self {
            started: Instant::now(),
            taken: 0,
            every: every.max(1),
        }
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    /// Counts one finished job. Returns the line to log, if this job is due
    /// one; the last job of a batch always is.
    pub fn job_done(
        &mut self,
        path: &Path,
        remaining: usize,
        local_files: usize,
    ) -> Option<String> {
        self.taken += 1;
        if remaining > 0 && self.taken % self.every != 0 {
            return None;
        }
        Some(progress_line(self.taken, remaining, &clock_time(&Local::now()), path, local_files))
    }

    pub fn finish(&self) -> String {
        format!("Parsed {} files in {} ms", self.taken, self.started.elapsed().as_millis())
    }
}

pub(crate) fn progress_line(
    taken: usize,
    remaining: usize,
    time: &str,
    path: &Path,
    local_files: usize,
) -> String {
    let total = taken + remaining;
    let percent = if total == 0 {
        100
    } else {
        ((taken as f64 / total as f64) * 100.0).round() as u32
    };
    format!("[{percent:>3}%] {taken}/{total} {time} {}, Files: {local_files}", path.display())
}

/// `HH:MM:SS` of `now` in its own time zone.
pub(crate) fn clock_time<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[path = "../tests/src/progress_tests.rs"]
mod tests;
