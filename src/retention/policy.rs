use crate::retention::error::{RetentionError, RetentionResult};
use crate::retention::types::{ExpirationStatus, RetentionWindow};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Creation times outside years 1..=9999 are rejected
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Retention calculations for a fixed window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: RetentionWindow,
}

impl RetentionPolicy {
    pub fn new(window: RetentionWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &RetentionWindow {
        &self.window
    }

    /// When a file created at `created_at` is deleted. Saturates at the
    /// latest representable instant.
    pub fn expiration_time(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at
            .checked_add_signed(self.window.retention)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Time left before deletion, never negative
    pub fn time_remaining(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let remaining = self.expiration_time(created_at) - now;
        remaining.max(Duration::zero())
    }

    pub fn status(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpirationStatus {
        let remaining = self.time_remaining(created_at, now);

        if remaining <= Duration::zero() {
            ExpirationStatus::Expired
        } else if remaining <= self.window.critical {
            ExpirationStatus::Critical
        } else if remaining <= self.window.warning {
            ExpirationStatus::Warning
        } else {
            ExpirationStatus::Normal
        }
    }

    /// True while the file is inside the warning window but not yet expired
    pub fn should_show_warning(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let remaining = self.time_remaining(created_at, now);
        remaining > Duration::zero() && remaining <= self.window.warning
    }

    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.time_remaining(created_at, now) <= Duration::zero()
    }

    /// "Expired", "N hours" below one day, "N days" from one day up.
    /// Both units round up.
    pub fn format_remaining(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        format_duration(self.time_remaining(created_at, now))
    }

    pub fn retention_display(&self) -> String {
        plural(self.window.retention_hours(), "hour")
    }

    pub fn warning_display(&self) -> String {
        plural(self.window.warning_hours(), "hour")
    }

    pub fn retention_description(&self) -> String {
        format!(
            "Files are automatically deleted after {} for your security and privacy.",
            self.retention_display()
        )
    }

    pub fn warning_message(&self, file_name: Option<&str>) -> String {
        let file_ref = match file_name {
            Some(name) => format!("\"{name}\""),
            None => "This file".to_string(),
        };
        format!(
            "{} will be deleted in {}. Please download or manage it before it expires.",
            file_ref,
            self.warning_display()
        )
    }
}

pub(crate) fn format_duration(remaining: Duration) -> String {
    let ms = remaining.num_milliseconds();
    if ms <= 0 {
        return "Expired".to_string();
    }

    if ms < DAY_MS {
        plural(div_ceil(ms, HOUR_MS), "hour")
    } else {
        plural(div_ceil(ms, DAY_MS), "day")
    }
}

fn div_ceil(value: i64, unit: i64) -> i64 {
    (value + unit - 1) / unit
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Parse a host-supplied creation timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` and `YYYY-MM-DDTHH:MM:SS[.fff]`
/// without offset (read as UTC), a bare `YYYY-MM-DD` (midnight UTC), and
/// integer Unix milliseconds. Anything outside years 1..=9999 is rejected.
pub fn parse_created_at(raw: &str) -> RetentionResult<DateTime<Utc>> {
    let parsed = parse_any(raw)?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&parsed.year()) {
        return Err(RetentionError::InvalidTimestamp(raw.to_string()));
    }
    Ok(parsed)
}

fn parse_any(raw: &str) -> RetentionResult<DateTime<Utc>> {
    let s = raw.trim();
    let invalid = || RetentionError::InvalidTimestamp(raw.to_string());

    if s.is_empty() {
        return Err(invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(invalid);
    }

    if let Ok(millis) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis).ok_or_else(invalid);
    }

    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::Rng;

    fn at(hours_ago: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(hours_ago)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expiration_time() {
        let policy = RetentionPolicy::default();
        let created = now();
        assert_eq!(policy.expiration_time(created), created + Duration::hours(72));
    }

    #[test]
    fn test_time_remaining_never_negative() {
        let policy = RetentionPolicy::default();
        let now = now();

        assert_eq!(policy.time_remaining(at(0, now), now), Duration::hours(72));
        assert_eq!(policy.time_remaining(at(70, now), now), Duration::hours(2));
        assert_eq!(policy.time_remaining(at(72, now), now), Duration::zero());
        assert_eq!(policy.time_remaining(at(500, now), now), Duration::zero());
    }

    #[test]
    fn test_status_bands() {
        let policy = RetentionPolicy::default();
        let now = now();

        assert_eq!(policy.status(at(0, now), now), ExpirationStatus::Normal);
        assert_eq!(policy.status(at(47, now), now), ExpirationStatus::Normal);
        assert_eq!(policy.status(at(48, now), now), ExpirationStatus::Warning);
        assert_eq!(policy.status(at(60, now), now), ExpirationStatus::Warning);
        assert_eq!(policy.status(at(66, now), now), ExpirationStatus::Critical);
        assert_eq!(policy.status(at(71, now), now), ExpirationStatus::Critical);
        assert_eq!(policy.status(at(72, now), now), ExpirationStatus::Expired);
        assert_eq!(policy.status(at(100, now), now), ExpirationStatus::Expired);
    }

    #[test]
    fn test_status_monotonic() {
        let policy = RetentionPolicy::default();
        let created = now();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let mut offsets: Vec<i64> = (0..20).map(|_| rng.gen_range(0..100 * HOUR_MS)).collect();
            offsets.sort_unstable();

            let mut previous = ExpirationStatus::Normal;
            for offset in offsets {
                let status = policy.status(created, created + Duration::milliseconds(offset));
                assert!(status >= previous, "status went from {previous} to {status}");
                previous = status;
            }
        }
    }

    #[test]
    fn test_warning_and_expired_flags() {
        let policy = RetentionPolicy::default();
        let now = now();

        assert!(!policy.should_show_warning(at(10, now), now));
        assert!(policy.should_show_warning(at(50, now), now));
        assert!(!policy.should_show_warning(at(72, now), now));

        assert!(!policy.is_expired(at(71, now), now));
        assert!(policy.is_expired(at(72, now), now));
    }

    #[test]
    fn test_format_remaining_boundaries() {
        let policy = RetentionPolicy::default();
        let now = now();
        let created_for = |remaining: Duration| now + remaining - Duration::hours(72);

        let just_under_day = Duration::hours(24) - Duration::milliseconds(1);
        assert_eq!(policy.format_remaining(created_for(just_under_day), now), "24 hours");
        assert_eq!(policy.format_remaining(created_for(Duration::hours(24)), now), "1 day");
        assert_eq!(policy.format_remaining(created_for(Duration::zero()), now), "Expired");
        assert_eq!(policy.format_remaining(created_for(Duration::hours(-3)), now), "Expired");
    }

    #[test]
    fn test_format_remaining_singular_and_rounding() {
        assert_eq!(format_duration(Duration::hours(1)), "1 hour");
        assert_eq!(format_duration(Duration::minutes(10)), "1 hour");
        assert_eq!(format_duration(Duration::minutes(61)), "2 hours");
        assert_eq!(format_duration(Duration::hours(23)), "23 hours");
        assert_eq!(format_duration(Duration::hours(25)), "2 days");
        assert_eq!(format_duration(Duration::hours(48)), "2 days");
        assert_eq!(format_duration(Duration::hours(72)), "3 days");
    }

    #[test]
    fn test_messages() {
        let policy = RetentionPolicy::default();
        assert_eq!(
            policy.retention_description(),
            "Files are automatically deleted after 72 hours for your security and privacy."
        );
        assert_eq!(
            policy.warning_message(Some("report.pdf")),
            "\"report.pdf\" will be deleted in 24 hours. Please download or manage it before it expires."
        );
        assert!(policy.warning_message(None).starts_with("This file will be deleted"));
    }

    #[test]
    fn test_parse_created_at_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(parse_created_at("2024-05-01T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_created_at("2024-05-01T14:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_created_at("2024-05-01 12:00:00").unwrap(), expected);
        assert_eq!(parse_created_at("2024-05-01T12:00:00.000").unwrap(), expected);
        assert_eq!(
            parse_created_at(&expected.timestamp_millis().to_string()).unwrap(),
            expected
        );
        assert_eq!(
            parse_created_at("2024-05-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_created_at_rejects_out_of_range() {
        let far_future = DateTime::<Utc>::MAX_UTC.timestamp_millis().to_string();
        let far_past = DateTime::<Utc>::MIN_UTC.timestamp_millis().to_string();

        for raw in [far_future.as_str(), far_past.as_str(), "8210266876799999"] {
            assert!(
                matches!(parse_created_at(raw), Err(RetentionError::InvalidTimestamp(_))),
                "accepted {raw:?}"
            );
        }

        let last_ok = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            parse_created_at(&last_ok.timestamp_millis().to_string()).unwrap(),
            last_ok
        );
    }

    #[test]
    fn test_expiration_saturates_near_max() {
        let policy = RetentionPolicy::default();
        let latest = DateTime::<Utc>::MAX_UTC;

        assert_eq!(policy.expiration_time(latest), latest);
        assert_eq!(policy.status(latest, now()), ExpirationStatus::Normal);
        assert!(policy.format_remaining(latest, now()).ends_with("days"));
    }

    #[test]
    fn test_parse_created_at_rejects_garbage() {
        for raw in ["", "   ", "yesterday", "2024-13-45", "Invalid Date"] {
            assert!(
                matches!(parse_created_at(raw), Err(RetentionError::InvalidTimestamp(_))),
                "accepted {raw:?}"
            );
        }
    }
}
