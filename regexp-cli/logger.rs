// A minimal logger for the `log` crate that prints to stderr. Level
// filtering happens globally through `log::set_max_level`, so there is
// nothing to filter here.

use log::Log;

#[derive(Debug)]
pub struct Logger(());

const LOGGER: &Logger = &Logger(());

impl Logger {
    /// Installs this logger as the global one.
    pub fn init() -> Result<(), log::SetLoggerError> {
        log::set_logger(LOGGER)
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        eprintln!("{}|{}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        // eprintln! flushes on every call.
    }
}
