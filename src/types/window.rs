//! The observation time range requested for every station of a cycle.

use chrono::{DateTime, Days, NaiveTime, TimeDelta, Timelike, Utc};
use std::fmt;

const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The time range of observations to request, always inside "yesterday" (UTC).
///
/// The provider only certifies the early hours of the previous day until late
/// morning, so a cycle started before the cutoff asks for `00:00:00..=05:59:59`
/// and a cycle started at or after it asks for the whole day `00:00:00..=23:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Which part of yesterday a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpan {
    EarlyHours,
    FullDay,
}

impl WindowSpan {
    fn length(self) -> TimeDelta {
        match self {
            WindowSpan::EarlyHours => TimeDelta::hours(6) - TimeDelta::seconds(1),
            WindowSpan::FullDay => TimeDelta::days(1) - TimeDelta::seconds(1),
        }
    }
}

impl RetrievalWindow {
    /// Computes the window for a cycle running at `now`.
    ///
    /// Only the hour and minute of `now` are compared against `cutoff`.
    pub fn for_cycle(now: DateTime<Utc>, cutoff: NaiveTime) -> Self {
        let span = if (now.hour(), now.minute()) < (cutoff.hour(), cutoff.minute()) {
            WindowSpan::EarlyHours
        } else {
            WindowSpan::FullDay
        };
        let yesterday = now.date_naive() - Days::new(1);
        let start = yesterday.and_time(NaiveTime::MIN).and_utc();
        Self {
            start,
            end: start + span.length(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn span(&self) -> WindowSpan {
        if self.end - self.start > WindowSpan::EarlyHours.length() {
            WindowSpan::FullDay
        } else {
            WindowSpan::EarlyHours
        }
    }

    /// Start timestamp in the format the provider expects (`2024-03-01T00:00:00Z`).
    pub fn start_param(&self) -> String {
        self.start.format(API_TIMESTAMP_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(API_TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for RetrievalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.start_param(), self.end_param())
    }
}
