use std::path::Path;

use chrono::{FixedOffset, TimeZone, Utc};

use super::{BatchProgress, clock_time, progress_line};

#[test]
fn progress_line_pads_percentage() {
    assert_eq!(
        progress_line(1, 1, "14:03:27", Path::new("/src/a.cpp"), 3),
        "[ 50%] 1/2 14:03:27 /src/a.cpp, Files: 3"
    );
    assert_eq!(progress_line(3, 0, "00:00:00", Path::new("b.cpp"), 1), "[100%] 3/3 00:00:00 b.cpp, Files: 1");
    assert_eq!(progress_line(1, 2, "00:00:00", Path::new("c.cpp"), 1), "[ 33%] 1/3 00:00:00 c.cpp, Files: 1");
}

#[test]
fn clock_time_follows_the_time_zone() {
    let at = Utc.with_ymd_and_hms(2024, 1, 4, 14, 3, 27).unwrap();
    assert_eq!(clock_time(&at), "14:03:27");

    let berlin = FixedOffset::east_opt(3600).unwrap();
    assert_eq!(clock_time(&at.with_timezone(&berlin)), "15:03:27");
    let near_midnight = FixedOffset::west_opt(15 * 3600).unwrap();
    assert_eq!(clock_time(&at.with_timezone(&near_midnight)), "23:03:27");
}

#[test]
fn job_done_respects_interval_but_always_reports_last_job() {
    let mut progress = BatchProgress::start(2);
    assert!(progress.job_done(Path::new("a.cpp"), 3, 1).is_none());
    assert!(progress.job_done(Path::new("b.cpp"), 2, 1).is_some());
    assert!(progress.job_done(Path::new("c.cpp"), 1, 1).is_none());
    let last = progress.job_done(Path::new("d.cpp"), 0, 1).expect("last job reports");
    assert!(last.starts_with("[100%] 4/4 "));
    assert!(last.ends_with("d.cpp, Files: 1"));
    assert_eq!(progress.taken(), 4);
    assert!(progress.finish().starts_with("Parsed 4 files in "));
}
