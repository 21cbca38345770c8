//! File logging and small shared helpers.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

pub const LOG_FILE: &str = "logs.txt";

pub(crate) fn home_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        env::var("HOME").ok().map(PathBuf::from)
    }
    #[cfg(windows)]
    {
        env::var("USERPROFILE").ok().map(PathBuf::from)
    }
}

/// Directory for log output: GOPM_STATE_DIR when set, otherwise ~/.gopm,
/// otherwise the current directory.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = env::var("GOPM_STATE_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    home_dir()
        .map(|h| h.join(".gopm"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn is_quiet() -> bool {
    if env::var("GOPM_QUIET")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
    {
        return true;
    }
    env::var("GOPM_LOG")
        .map(|v| v.eq_ignore_ascii_case("quiet") || v.eq_ignore_ascii_case("error"))
        .unwrap_or(false)
}

/// Append a timestamped line to the log file, echoing to stdout unless
/// quiet. Append-only: no read-back, safe to call from worker threads.
pub fn log(message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let line = format!("[{}] {}", timestamp, message);

    if !is_quiet() {
        println!("{}", line);
    }

    let dir = state_dir();
    let _ = fs::create_dir_all(&dir);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Echo to stderr and record in the log file.
pub fn log_error(message: &str) {
    eprintln!("{}", message);
    log(message);
}

/// 1024-based human-readable size.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!(
        "{:.1} {}B",
        bytes as f64 / div as f64,
        ['K', 'M', 'G', 'T', 'P', 'E'][exp]
    )
}
