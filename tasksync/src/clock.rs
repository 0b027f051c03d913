//! Time inputs for one run.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeDelta};

use crate::core::render::RenderContext;
use crate::io::todoist::CompletedWindow;

/// The instant a run started, in the machine's local offset.
///
/// Pipelines take the clock as an argument so tests can pin "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    pub now: DateTime<FixedOffset>,
}

impl RunClock {
    pub fn now() -> Self {
        Self {
            now: Local::now().fixed_offset(),
        }
    }

    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// `YYYY-MM-DD` of today.
    pub fn date_label(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }

    /// Human-readable stamp for "Last updated" footers.
    pub fn stamp(&self) -> String {
        self.now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            today: self.today(),
            offset: *self.now.offset(),
        }
    }

    /// Local midnight until now, expressed in UTC for the completed-tasks query.
    pub fn completed_window(&self, limit: u32) -> CompletedWindow {
        let offset = TimeDelta::seconds(i64::from(self.now.offset().local_minus_utc()));
        let midnight = self.today().and_time(NaiveTime::MIN);
        CompletedWindow {
            since: midnight - offset,
            until: self.now.naive_utc(),
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_window_starts_at_local_midnight_in_utc() {
        let clock =
            RunClock::at(DateTime::parse_from_rfc3339("2024-05-01T08:15:00+09:00").expect("ts"));
        let window = clock.completed_window(50);
        assert_eq!(window.since.to_string(), "2024-04-30 15:00:00");
        assert_eq!(window.until.to_string(), "2024-04-30 23:15:00");
        assert_eq!(window.limit, 50);
    }

    #[test]
    fn labels_use_local_date() {
        let clock =
            RunClock::at(DateTime::parse_from_rfc3339("2024-05-01T00:30:00+09:00").expect("ts"));
        assert_eq!(clock.date_label(), "2024-05-01");
        assert_eq!(clock.stamp(), "2024-05-01 00:30:00");
    }
}
