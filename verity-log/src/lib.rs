//! Verity Logging
//!
//! Lightweight, environment-controlled logging shared by the Verity crates.
//! Verification runs are hot loops, so every macro checks a global atomic
//! level before formatting anything.
//!
//! # Usage
//!
//! ```rust
//! use verity_log::{debug, trace, warn};
//!
//! debug!("verifying {} fields", 3);
//! trace!(target: "verity::field", "field {} is valid", "email");
//! warn!("Unknown filter: {}", "foobazgorch");
//! ```
//!
//! # Environment Variables
//!
//! - `VERITY_DEBUG=1` - Enable debug logging
//! - `VERITY_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `VERITY_LOG_FORMAT=compact|json` - Set stderr output format
//! - `VERITY_LOG_BACKEND=stderr|log` - Write to stderr or forward to the `log` facade
//! - `VERITY_LOG_TIMESTAMPS=1|0` - Include timestamps in compact output

use once_cell::sync::Lazy;
use std::env;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Levels, formats, backends
// ============================================================================

/// Log level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Nothing is emitted
    Off = 5,
}

impl Level {
    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }

    fn to_log(self) -> Option<log::Level> {
        match self {
            Level::Trace => Some(log::Level::Trace),
            Level::Debug => Some(log::Level::Debug),
            Level::Info => Some(log::Level::Info),
            Level::Warn => Some(log::Level::Warn),
            Level::Error => Some(log::Level::Error),
            Level::Off => None,
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stderr output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `HH:MM:SS.mmm LEVEL target: message`
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "pretty" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Write directly to stderr using [`Format`]
    Stderr,
    /// Forward to whatever logger is installed behind the `log` facade
    Log,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stderr" => Ok(Backend::Stderr),
            "log" => Ok(Backend::Log),
            other => Err(format!("unknown log backend: {}", other)),
        }
    }
}

// ============================================================================
// Global configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Warn by default: a verification library should stay quiet unless asked.
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug: bool,
    pub level: Level,
    pub format: Format,
    pub backend: Backend,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Warn,
            format: Format::Compact,
            backend: Backend::Stderr,
            timestamps: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl LogConfig {
    /// Build the configuration from `VERITY_*` environment variables and
    /// publish the resulting level to the global atomics.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("VERITY_DEBUG").unwrap_or(defaults.debug);
        let level = env_parse("VERITY_LOG_LEVEL").unwrap_or(if debug {
            Level::Debug
        } else {
            defaults.level
        });

        let config = Self {
            debug,
            level,
            format: env_parse("VERITY_LOG_FORMAT").unwrap_or(defaults.format),
            backend: env_parse("VERITY_LOG_BACKEND").unwrap_or(defaults.backend),
            timestamps: env_flag("VERITY_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
        };

        DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
        LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
        config
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Force environment configuration to load now instead of on first use.
///
/// Every level query and override loads it first, so calling this is
/// optional.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// The configuration read from the environment.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

#[inline]
pub fn is_debug_enabled() -> bool {
    init();
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn current_level() -> Level {
    init();
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Override the level at runtime.
pub fn set_level(level: Level) {
    // Load first, or a later first use would reset the override.
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Toggle debug mode at runtime; enabling it lowers the level to `Debug`.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

// ============================================================================
// Output
// ============================================================================

#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    if !is_level_enabled(level) {
        return;
    }

    let config = config();
    match config.backend {
        Backend::Log => {
            if let Some(lvl) = level.to_log() {
                log::log!(target: target, lvl, "{}", message);
            }
        }
        Backend::Stderr => match config.format {
            Format::Compact => write_compact(level, target, message, config.timestamps),
            Format::Json => write_json(level, target, message),
        },
    }
}

fn write_compact(level: Level, target: &str, message: &str, timestamps: bool) {
    let mut stderr = std::io::stderr().lock();
    if timestamps {
        let _ = write!(stderr, "{} ", chrono::Local::now().format("%H:%M:%S%.3f"));
    }
    let _ = writeln!(stderr, "{:5} {}: {}", level.as_str(), target, message);
}

#[cfg(feature = "json")]
fn write_json(level: Level, target: &str, message: &str) {
    #[derive(serde::Serialize)]
    struct Line<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
    }

    let line = Line {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
    };

    if let Ok(json) = serde_json::to_string(&line) {
        eprintln!("{}", json);
    }
}

#[cfg(not(feature = "json"))]
fn write_json(level: Level, target: &str, message: &str) {
    // Without serde, fall back to the compact layout.
    write_compact(level, target, message, true);
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($level) {
            $crate::log($level, $target, &format!($($arg)+));
        }
    };
    ($level:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($level) {
            $crate::log($level, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at trace level.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Trace, $($arg)+) };
}

/// Log at debug level.
///
/// ```rust
/// use verity_log::debug;
///
/// let field = "email";
/// debug!(target: "verity::verifier", "dependent of {} failed", field);
/// ```
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Debug, $($arg)+) };
}

/// Log at info level.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Info, $($arg)+) };
}

/// Log at warn level.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Warn, $($arg)+) };
}

/// Log at error level.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Error, $($arg)+) };
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! A `tracing` subscriber honoring the Verity level.

    use super::*;

    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{EnvFilter, fmt};

        let directive = config().level.as_str().to_lowercase();
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
    }
}
