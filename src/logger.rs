use chrono::{DateTime, Utc};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub time_format: String,
    /// Records whose module path contains any of these are dropped.
    pub mod_filter: Vec<&'static str>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LevelFilter::Info,
            time_format: "%Y-%m-%d %H:%M:%S%z".to_string(),
            mod_filter: vec!["attohttpc", "rustls"],
        }
    }
}

/// Writes log records to stdout, on the same stream as the log table.
#[derive(Clone, Debug)]
pub struct ConsoleLogger {
    config: LoggingConfig,
}

impl ConsoleLogger {
    pub fn new(config: LoggingConfig) -> Self {
        ConsoleLogger { config }
    }

    /// Install as the global `log` logger.
    pub fn init(config: LoggingConfig) -> Result<(), SetLoggerError> {
        let level = config.level;
        log::set_boxed_logger(Box::new(ConsoleLogger::new(config)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn skipped(&self, module: Option<&str>) -> bool {
        module
            .map(|m| self.config.mod_filter.iter().any(|f| m.contains(*f)))
            .unwrap_or(false)
    }

    fn render(&self, record: &Record, time: DateTime<Utc>) -> Option<String> {
        if !self.enabled(record.metadata()) || self.skipped(record.module_path()) {
            return None;
        }
        Some(format!(
            "{time} {level} [{module}] {body}",
            time = time.format(&self.config.time_format),
            level = record.level(),
            module = record.module_path().unwrap_or("-"),
            body = record.args()
        ))
    }

    /// Write failures (a closed pipe, say) are dropped.
    fn write_to(&self, out: &mut impl Write, record: &Record, time: DateTime<Utc>) {
        if let Some(line) = self.render(record, time) {
            let _ = writeln!(out, "{}", line);
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.level
    }

    fn log(&self, record: &Record) {
        self.write_to(&mut io::stdout().lock(), record, Utc::now());
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use log::Level;

    fn render(logger: &ConsoleLogger, level: Level, module: &str, msg: &str) -> Option<String> {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        logger.render(
            &Record::builder()
                .level(level)
                .module_path(Some(module))
                .args(format_args!("{}", msg))
                .build(),
            time,
        )
    }

    #[test]
    fn test_format() {
        let logger = ConsoleLogger::new(LoggingConfig::default());
        assert_eq!(
            render(&logger, Level::Error, "query_logs::poll", "boom").as_deref(),
            Some("2024-03-01 12:30:00+0000 ERROR [query_logs::poll] boom")
        );
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_closed_stdout_does_not_panic() {
        let logger = ConsoleLogger::new(LoggingConfig::default());
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        logger.write_to(
            &mut ClosedPipe,
            &Record::builder()
                .level(Level::Warn)
                .module_path(Some("query_logs::poll"))
                .args(format_args!("Unable to write log rows"))
                .build(),
            time,
        );

        let mut buf = Vec::new();
        logger.write_to(
            &mut buf,
            &Record::builder()
                .level(Level::Warn)
                .module_path(Some("query_logs::poll"))
                .args(format_args!("ok"))
                .build(),
            time,
        );
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "2024-03-01 12:30:00+0000 WARN [query_logs::poll] ok\n"
        );
    }

    #[test]
    fn test_level_filter() {
        let logger = ConsoleLogger::new(LoggingConfig {
            level: LevelFilter::Warn,
            ..LoggingConfig::default()
        });
        assert!(render(&logger, Level::Info, "query_logs::poll", "quiet").is_none());
        assert!(render(&logger, Level::Warn, "query_logs::poll", "loud").is_some());
    }

    #[test]
    fn test_module_filter() {
        let logger = ConsoleLogger::new(LoggingConfig::default());
        assert!(render(&logger, Level::Error, "attohttpc::streams", "noise").is_none());
        assert!(render(&logger, Level::Error, "query_logs::client", "signal").is_some());
    }
}
