use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SEND_TZ: Tz = chrono_tz::Europe::Warsaw;

/// The one minute of the day, in a fixed timezone, at which notifications go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendWindow {
    pub hour: u32,
    pub minute: u32,
    pub tz: Tz,
}

impl SendWindow {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(anyhow!("Invalid send time {:02}:{:02}", hour, minute));
        }
        Ok(Self {
            hour,
            minute,
            tz: DEFAULT_SEND_TZ,
        })
    }

    pub fn with_timezone(self, tz: Tz) -> Self {
        Self { tz, ..self }
    }

    /// Wall-clock check against a time already expressed in `self.tz`.
    pub fn is_open(&self, local: NaiveTime) -> bool {
        local.hour() == self.hour && local.minute() == self.minute
    }

    /// Whether `instant` falls in the window, independent of the host timezone.
    pub fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        self.is_open(instant.with_timezone(&self.tz).time())
    }

    pub fn is_open_now(&self) -> bool {
        self.is_open_at(Utc::now())
    }
}

impl Default for SendWindow {
    fn default() -> Self {
        Self {
            hour: 14,
            minute: 0,
            tz: DEFAULT_SEND_TZ,
        }
    }
}

/// Parses an IANA timezone name such as `Europe/Warsaw`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("Unknown timezone {:?}: {}", name, e))
}

impl FromStr for SendWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("Send time must be HH:MM, got {:?}", s))?;
        let hour = hour
            .parse()
            .map_err(|_| anyhow!("Invalid hour in send time {:?}", s))?;
        let minute = minute
            .parse()
            .map_err(|_| anyhow!("Invalid minute in send time {:?}", s))?;
        SendWindow::new(hour, minute)
    }
}

impl fmt::Display for SendWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
