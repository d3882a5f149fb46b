use evlog::Logger;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// Installs the process-wide logger. Only the first call has any effect.
pub fn set_logger(logger: Logger) {
    let _ = LOGGER.set(logger);
}

/// Returns the installed logger, or a logger with no printers if none was installed (as in tests).
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(Logger::default)
}
