//! Leveled console logging.
//!
//! Every line goes to stderr behind a bold colored level tag. The host picks the maximum level
//! once at startup; engine code checks [`enabled`] before formatting anything expensive (the CPU
//! trace runs once per instruction).

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use ansi_term::ANSIString;
use ansi_term::Colour::{Blue, Green, Purple, Red, Yellow};

/// Log verbosity, from least to most chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 1,
    Warn,
    Info,
    Debug,
    Trace,
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

impl Level {
    fn tag(self) -> ANSIString<'static> {
        match self {
            Level::Error => Red.bold().paint("ERROR"),
            Level::Warn => Yellow.bold().paint("WARN "),
            Level::Info => Green.bold().paint("INFO "),
            Level::Debug => Blue.bold().paint("DEBUG"),
            Level::Trace => Purple.bold().paint("TRACE"),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" | "" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            other => Err(format!(
                "invalid log level \"{other}\"; should be one of \"error\", \"warn\", \"info\", \"debug\", \"trace\""
            )),
        }
    }
}

/// Set the most verbose level that still gets printed.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> Level {
    match MAX_LEVEL.load(Ordering::Relaxed) {
        1 => Level::Error,
        2 => Level::Warn,
        3 => Level::Info,
        4 => Level::Debug,
        _ => Level::Trace,
    }
}

/// True when a message at `level` would be printed.
pub fn enabled(level: Level) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn write(level: Level, args: fmt::Arguments<'_>) {
    if enabled(level) {
        eprintln!("{} {}", level.tag(), args);
    }
}

#[macro_export]
macro_rules! error {
    ($($args:tt)*) => { $crate::log::write($crate::log::Level::Error, format_args!($($args)*)) };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => { $crate::log::write($crate::log::Level::Warn, format_args!($($args)*)) };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)*) => { $crate::log::write($crate::log::Level::Info, format_args!($($args)*)) };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => { $crate::log::write($crate::log::Level::Debug, format_args!($($args)*)) };
}

#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => { $crate::log::write($crate::log::Level::Trace, format_args!($($args)*)) };
}
