use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;
use time::OffsetDateTime;

fn use_color() -> bool {
    static USE_COLOR: OnceLock<bool> = OnceLock::new();
    *USE_COLOR.get_or_init(|| env::var_os("NO_COLOR").is_none())
}

fn is_tty() -> bool {
    static IS_TTY: OnceLock<bool> = OnceLock::new();
    *IS_TTY.get_or_init(|| io::stderr().is_terminal())
}

pub fn is_logging_enabled() -> bool {
    static VERBOSE: OnceLock<bool> = OnceLock::new();
    *VERBOSE.get_or_init(|| match env::var("PREFLIGHT_VERBOSE") {
        Ok(value) => {
            let v = value.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on")
        }
        Err(_) => false,
    })
}

fn paint(code: &str, text: &str) -> String {
    if use_color() {
        format!("\u{1b}[{}m{}\u{1b}[0m", code, text)
    } else {
        text.to_string()
    }
}

pub fn bold(text: &str) -> String {
    paint("1", text)
}

fn dim(text: &str) -> String {
    paint("2", text)
}

pub fn green(text: &str) -> String {
    paint("32", text)
}

pub fn red(text: &str) -> String {
    paint("31", text)
}

fn cyan(text: &str) -> String {
    paint("36", text)
}

fn yellow(text: &str) -> String {
    paint("33", text)
}

pub fn header(command: &str, version: &str) {
    eprintln!("{}", dim(&format!("preflight {} v{}", command, version)));
    eprintln!();
}

/// Rewrite the current status line in place. Non-TTY output gets plain
/// newline-terminated lines instead.
pub fn status(message: &str) {
    if is_tty() {
        eprint!("\r\u{1b}[K{}", dim(message));
        let _ = io::stderr().flush();
    } else {
        eprintln!("{}", dim(message));
    }
}

pub fn status_count(message: &str, count: usize) {
    if is_tty() {
        eprint!("\r\u{1b}[K{} {}", dim(message), cyan(&format!("[{}]", count)));
        let _ = io::stderr().flush();
    } else {
        eprintln!("{} {}", dim(message), cyan(&format!("[{}]", count)));
    }
}

pub fn clear_line() {
    if is_tty() {
        eprint!("\r\u{1b}[K");
        let _ = io::stderr().flush();
    }
}

pub fn info(message: &str) {
    println!("{}", message);
}

pub fn warn(message: &str) {
    let tag = yellow("warn");
    eprintln!("{} {}", tag, message);
}

pub fn error(message: &str) {
    let tag = red("error");
    eprintln!("{} {}", tag, message);
}

pub fn verbose(message: &str) {
    if is_logging_enabled() {
        eprintln!("{}", dim(message));
    }
}

/// Human-readable byte count, decimal units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

pub fn relative_time(then: Option<OffsetDateTime>) -> String {
    match then {
        Some(then) => relative_time_from(then, OffsetDateTime::now_utc()),
        None => "-".to_string(),
    }
}

pub fn relative_time_from(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - then;
    let seconds = elapsed.whole_seconds();

    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = elapsed.whole_minutes();
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = elapsed.whole_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = elapsed.whole_days();
    if days < 30 {
        return plural(days, "day");
    }

    let months = days / 30;
    if months < 12 {
        return plural(months, "month");
    }

    plural(days / 365, "year")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
