use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::core::error::{Result, StoreError};

/// Source of the current instant
///
/// Stores read time only through this trait so callers can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Renders instants for timestamp columns
///
/// The timezone is a parameter of the renderer, never process state.
#[derive(Debug, Clone)]
pub struct Timestamper {
    format: String,
    timezone: Tz,
}

impl Timestamper {
    /// Build a renderer, rejecting malformed strftime formats and unknown
    /// IANA zone names
    pub fn new(format: &str, timezone: Option<&str>) -> Result<Self> {
        if format.is_empty() {
            return Err(StoreError::configuration("time format must not be empty"));
        }
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(StoreError::configuration(format!(
                "invalid time format: {}",
                format
            )));
        }

        let timezone = match timezone {
            Some(name) => parse_timezone(name)?,
            None => Tz::UTC,
        };

        Ok(Self {
            format: format.to_string(),
            timezone,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Render `instant` in the configured zone and format
    pub fn render(&self, instant: DateTime<Utc>) -> String {
        // Format was validated in `new`.
        instant
            .with_timezone(&self.timezone)
            .format(&self.format)
            .to_string()
    }
}

/// Parse an IANA timezone name such as `Asia/Jakarta`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| StoreError::configuration(format!("unknown timezone: {}", name)))
}
