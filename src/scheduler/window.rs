//! Daily posting window

use chrono::NaiveTime;

use super::error::SchedulerError;

/// Inclusive daily time window in which jobs may execute
///
/// Both bounds are inclusive: a window of 09:00..18:00 admits exactly
/// 09:00:00 and 18:00:00. Overnight windows (start after end) are rejected
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl PostingWindow {
    /// Build a window, rejecting inverted bounds
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SchedulerError> {
        if start > end {
            return Err(SchedulerError::InvalidSchedule(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether the given time of day falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }

    /// Window length in whole minutes
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_inclusive_bounds() {
        let window = PostingWindow::new(t(9, 0), t(18, 0)).unwrap();
        assert!(!window.contains(t(8, 59)));
        assert!(window.contains(t(9, 0)));
        assert!(window.contains(t(12, 30)));
        assert!(window.contains(t(18, 0)));
        assert!(!window.contains(t(18, 1)));
    }

    #[test]
    fn test_single_minute_window() {
        let window = PostingWindow::new(t(12, 0), t(12, 0)).unwrap();
        assert!(window.contains(t(12, 0)));
        assert!(!window.contains(t(12, 1)));
        assert_eq!(window.span_minutes(), 0);
    }

    #[test]
    fn test_overnight_rejected() {
        assert!(PostingWindow::new(t(22, 0), t(6, 0)).is_err());
    }

    #[test]
    fn test_span() {
        let window = PostingWindow::new(t(9, 0), t(18, 0)).unwrap();
        assert_eq!(window.span_minutes(), 540);
    }
}
