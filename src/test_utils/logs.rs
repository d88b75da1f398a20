//! Process-wide log capture.
//!
//! `logtest::Logger::start` installs the global logger and may only run
//! once per process, so every test shares this instance. Tests that read
//! records must be `#[serial]`.

use logtest::{Logger, Record};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

static LOGGER: Lazy<Mutex<Logger>> = Lazy::new(|| Mutex::new(Logger::start()));

/// Lock the shared logger after discarding records left by earlier tests.
pub fn capture() -> MutexGuard<'static, Logger> {
    let mut logger = LOGGER.lock();
    while logger.pop().is_some() {}
    logger
}

/// Drain captured records at `level` and return their messages.
pub fn drain(logger: &mut Logger, level: log::Level) -> Vec<String> {
    std::iter::from_fn(|| logger.pop())
        .filter(|record: &Record| record.level() == level)
        .map(|record| record.args().to_owned())
        .collect()
}
