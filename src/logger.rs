use std::env;
use std::path::Path;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use simple_logger::SimpleLogger;
use syslog::{BasicLogger, Facility, Formatter3164};

/// Diagnostics sink for auditcap. Records are written to stderr and,
/// when `/dev/log` accepts connections, to syslog. Standard output
/// carries captured events only.
pub struct Logger {
    console: SimpleLogger,
    syslog: Option<BasicLogger>,
}

/// Syslog tag for an invocation path: its final component.
pub fn process_name(argv0: &str) -> String {
    match Path::new(argv0).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => "auditcap".into(),
    }
}

impl Logger {
    pub fn new(process: &str) -> Self {
        let console = SimpleLogger::new().with_utc_timestamps();
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: process.into(),
            pid: std::process::id(),
        };
        let syslog = match syslog::unix(formatter) {
            Ok(l) => Some(BasicLogger::new(l)),
            Err(_) => None,
        };
        Logger { console, syslog }
    }

    /// Makes a logger tagged after `argv[0]` the global `log` backend.
    pub fn install(level: LevelFilter) -> Result<(), SetLoggerError> {
        let argv0 = env::args().next().unwrap_or_default();
        log::set_boxed_logger(Box::new(Logger::new(&process_name(&argv0))))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.console.log(record);
        if let Some(syslog) = &self.syslog {
            syslog.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(syslog) = &self.syslog {
            syslog.flush();
        }
    }
}
