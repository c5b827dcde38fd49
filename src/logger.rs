//! Process-wide logging setup on top of `log4rs`.
//!
//! Two rolling files are written under the log directory: `app.log` for everything, and
//! `ops.log` for the one-line operation records emitted on the `bookstore::ops` target.

use crate::config::LoggingConfig;
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

pub const OPS_TARGET: &str = "bookstore::ops";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Maps `error|warn|info|debug|trace|off` to a filter; anything else is `info`.
#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder().build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Configure logging globally for the process.
/// - dir: base directory for logs; if None, current directory.
/// - level: error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// A second call after the logger is installed is ignored.
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender cannot be built.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = retention.and_then(|r| u32::try_from(r).ok()).unwrap_or(DEFAULT_RETENTION);
    let lvl = level.map_or(LevelFilter::Info, parse_level);

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("ops", Box::new(rolling(&base, "ops", keep)?)))
        .logger(Logger::builder().appender("ops").additive(false).build(OPS_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already initialized; keeping existing configuration");
    }
    Ok(())
}

/// Configure logging from a loaded `[logging]` section.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_config(cfg: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    configure_logging(cfg.dir.as_deref(), cfg.level.as_deref(), cfg.retention)
}

/// Configure logging from environment variables if present:
/// - BOOKSTORE_LOG_DIR
/// - BOOKSTORE_LOG_LEVEL
/// - BOOKSTORE_LOG_RETENTION
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = LoggingConfig::default();
    cfg.apply_env();
    configure_from_config(&cfg)
}
