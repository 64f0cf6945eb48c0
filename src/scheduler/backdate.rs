//! Backdate slot planner
//!
//! Produces per-day execution slots across a historical date range so that
//! bulk-scheduled posts read like an organic posting history: weekends are
//! skipped, slots divide the posting window evenly, and each slot is
//! jittered forward by up to 20% of its interval.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rand::Rng;

use super::window::PostingWindow;

/// Plan execution slots over `start..=end` (dates inclusive)
///
/// Weekend days (ISO weekday 6 and 7) produce no slots. Only slots strictly
/// in the past relative to `now` are returned; a backdate run never creates
/// future-dated work. Slot times carry minute granularity, seconds are
/// always zero.
pub fn plan_slots(
    start: NaiveDate,
    end: NaiveDate,
    window: PostingWindow,
    posts_per_day: u32,
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let mut rng = rand::thread_rng();
    let mut slots = Vec::new();

    let mut day = start;
    while day <= end {
        if day.weekday().number_from_monday() < 6 {
            for slot in day_slots(day, window, posts_per_day, &mut rng) {
                if slot < now {
                    slots.push(slot);
                }
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    slots
}

/// Evenly divide the window for one day and jitter each slot forward
fn day_slots(
    day: NaiveDate,
    window: PostingWindow,
    posts_per_day: u32,
    rng: &mut impl Rng,
) -> Vec<NaiveDateTime> {
    let span = window.span_minutes().max(0);
    let interval = span / i64::from(posts_per_day.max(1));

    (0..posts_per_day)
        .map(|i| {
            let base = interval * i64::from(i);
            let jitter = if interval > 0 {
                rng.gen_range(0..=interval / 5)
            } else {
                0
            };
            let offset = (base + jitter).min(span);

            let time = truncate_seconds(window.start() + Duration::minutes(offset));
            day.and_time(time)
        })
        .collect()
}

fn truncate_seconds(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
