//! Wall-clock reconstruction for monitor logs that only print `hh:mm:ss AM`.
//!
//! sysstat tools print one calendar date in the file banner and a 12-hour
//! clock on every record. The date has to be carried forward by hand: each
//! PM→AM transition means midnight was crossed.

use chrono::{Days, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static DATE_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/(\d+)/(\d+)").expect("date anchor regex"));

/// Build a date from month/day/year text, accepting two-digit years.
pub fn date_from_mdy(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// First `mm/dd/yyyy` date in the log, used as the day anchor.
pub fn find_date_anchor(lines: &[String]) -> Option<NaiveDate> {
    lines.iter().find_map(|line| {
        let caps = DATE_ANCHOR_RE.captures(line)?;
        date_from_mdy(&caps[1], &caps[2], &caps[3])
    })
}

/// Convert a 12-hour clock reading to 24-hour.
///
/// Markers other than `AM`/`PM` mean the log already uses a 24-hour clock.
pub fn to_24_hour(hour: u32, marker: &str) -> u32 {
    match marker {
        "AM" if hour == 12 => 0,
        "PM" if hour != 12 => hour + 12,
        _ => hour,
    }
}

/// Carries the anchor date across midnight while walking records in order.
#[derive(Debug, Clone)]
pub struct RolloverClock {
    date: NaiveDate,
    prev_marker: Option<String>,
}

impl RolloverClock {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            date: anchor,
            prev_marker: None,
        }
    }

    /// Stamp one record. Returns `None` for an impossible clock reading.
    pub fn stamp(
        &mut self,
        hour: u32,
        minute: u32,
        second: u32,
        marker: &str,
    ) -> Option<NaiveDateTime> {
        if marker == "AM" && self.prev_marker.as_deref() == Some("PM") {
            self.date = self.date.checked_add_days(Days::new(1))?;
        }
        self.prev_marker = Some(marker.to_string());
        self.date.and_hms_opt(to_24_hour(hour, marker), minute, second)
    }
}
