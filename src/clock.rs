use time::Duration;
use time::OffsetDateTime;

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Uses the local offset when it can be determined, so that "tomorrow" means the user's
/// tomorrow. Falls back to UTC otherwise.
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
pub struct FixedClock(pub OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub fn to_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
}

pub fn end_of_tomorrow(now: OffsetDateTime) -> OffsetDateTime {
    now.date()
        .saturating_add(Duration::days(1))
        .with_hms(23, 59, 59)
        .expect("valid time")
        .assume_offset(now.offset())
}

pub fn thirty_days_ago(now: OffsetDateTime) -> OffsetDateTime {
    now.date()
        .saturating_sub(Duration::days(30))
        .with_hms(0, 0, 0)
        .expect("valid time")
        .assume_offset(now.offset())
}
