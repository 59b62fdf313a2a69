use chrono::Duration;
use std::str::FromStr;
use strum_macros::Display;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("unknown time unit: {0}")]
pub struct UnknownTimeUnit(pub String);

/// Unit of a gap threshold, spelled the numpy way (`s`, `m`, `h`, `D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TimeUnit {
    #[strum(serialize = "ms")]
    Milliseconds,
    #[strum(serialize = "s")]
    Seconds,
    #[strum(serialize = "m")]
    Minutes,
    #[strum(serialize = "h")]
    Hours,
    #[strum(serialize = "D")]
    Days,
}

impl TimeUnit {
    pub fn duration(self, value: i64) -> Duration {
        match self {
            TimeUnit::Milliseconds => Duration::milliseconds(value),
            TimeUnit::Seconds => Duration::seconds(value),
            TimeUnit::Minutes => Duration::minutes(value),
            TimeUnit::Hours => Duration::hours(value),
            TimeUnit::Days => Duration::days(value),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = UnknownTimeUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ms" => Ok(TimeUnit::Milliseconds),
            "s" => Ok(TimeUnit::Seconds),
            "m" => Ok(TimeUnit::Minutes),
            "h" => Ok(TimeUnit::Hours),
            "D" | "d" => Ok(TimeUnit::Days),
            other => Err(UnknownTimeUnit(other.to_string())),
        }
    }
}
