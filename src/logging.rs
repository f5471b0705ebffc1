use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::sync::OnceLock;

/// Environment variable holding the log level (`off`, `error` .. `trace`).
pub const LOG_LEVEL_ENV: &str = "RENAMER_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{} {} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Installs the stderr logger. Later calls keep the first level.
pub fn init() -> Result<(), SetLoggerError> {
    let level = parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}
