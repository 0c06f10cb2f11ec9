//! Epoch-millisecond conversions.
//!
//! The remote API and the local store both order records by `createdAt` in
//! milliseconds since the Unix epoch.

use time::OffsetDateTime;

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn to_unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inverse of [`to_unix_millis`]. Returns `None` outside the supported range.
#[must_use]
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// Current time truncated to the precision the store keeps.
#[must_use]
pub fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    from_unix_millis(to_unix_millis(now)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_precision_is_kept() {
        let at = from_unix_millis(1_504_095_567_183).unwrap();
        assert_eq!(to_unix_millis(at), 1_504_095_567_183);
    }

    #[test]
    fn test_now_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_out_of_range_millis() {
        assert!(from_unix_millis(i64::MAX).is_none());
    }
}
