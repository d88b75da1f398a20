//! Syslog severities carried in the GELF `level` field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Syslog severity, `0` (emergency) through `7` (debug).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GelfLevel {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    #[default]
    Informational = 6,
    Debug = 7,
}

impl GelfLevel {
    /// Numeric severity as written to the wire.
    pub fn severity(self) -> u8 {
        self as u8
    }

    /// Upper-case name used for the optional level-name field.
    pub fn as_str(self) -> &'static str {
        match self {
            GelfLevel::Emergency => "EMERGENCY",
            GelfLevel::Alert => "ALERT",
            GelfLevel::Critical => "CRITICAL",
            GelfLevel::Error => "ERROR",
            GelfLevel::Warning => "WARNING",
            GelfLevel::Notice => "NOTICE",
            GelfLevel::Informational => "INFO",
            GelfLevel::Debug => "DEBUG",
        }
    }

    /// Map a raw severity, rejecting values outside `0..=7`.
    pub fn from_severity(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Informational,
            7 => Self::Debug,
            _ => return None,
        })
    }
}

impl fmt::Display for GelfLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GelfLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EMERGENCY" | "EMERG" => Ok(Self::Emergency),
            "ALERT" => Ok(Self::Alert),
            "CRITICAL" | "CRIT" => Ok(Self::Critical),
            "ERROR" | "ERR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "NOTICE" => Ok(Self::Notice),
            "INFO" | "INFORMATIONAL" => Ok(Self::Informational),
            "DEBUG" | "TRACE" => Ok(Self::Debug),
            _ => Err(()),
        }
    }
}

/// `log` has no severities above error, and trace collapses onto debug.
impl From<log::Level> for GelfLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Informational,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(log::Level::Error, 3)]
    #[case(log::Level::Warn, 4)]
    #[case(log::Level::Info, 6)]
    #[case(log::Level::Debug, 7)]
    #[case(log::Level::Trace, 7)]
    fn maps_log_levels_to_syslog(#[case] level: log::Level, #[case] severity: u8) {
        assert_eq!(GelfLevel::from(level).severity(), severity);
    }

    #[rstest]
    fn parses_aliases_case_insensitively() {
        assert_eq!("warn".parse(), Ok(GelfLevel::Warning));
        assert_eq!("Crit".parse(), Ok(GelfLevel::Critical));
        assert!("verbose".parse::<GelfLevel>().is_err());
    }

    #[rstest]
    fn severity_round_trips_through_from_severity() {
        for value in 0..=7 {
            let level = GelfLevel::from_severity(value).expect("valid severity");
            assert_eq!(level.severity(), value);
        }
        assert_eq!(GelfLevel::from_severity(8), None);
    }
}
