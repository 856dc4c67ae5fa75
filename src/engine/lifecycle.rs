use chrono::{DateTime, Utc};

use crate::models::event::{EventStatus, RequestedStatus};

/// Computes the status an event should be persisted with.
///
/// An explicit `cancelled` always wins. `Recompute` or no request derives the
/// status from where `now` falls in `[start, end]`. Any other explicit status
/// is taken as-is for this write.
pub fn derive_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    requested: Option<RequestedStatus>,
) -> EventStatus {
    match requested {
        Some(RequestedStatus::Explicit(status)) => status,
        Some(RequestedStatus::Recompute) | None => status_at(now, start, end),
    }
}

/// Time-based status, ignoring any manual override.
pub fn status_at(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> EventStatus {
    if now < start {
        EventStatus::Upcoming
    } else if now <= end {
        EventStatus::Ongoing
    } else {
        EventStatus::Past
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_before_start_is_upcoming() {
        let start = t0() + Duration::hours(1);
        let end = t0() + Duration::hours(2);

        assert_eq!(derive_status(t0(), start, end, None), EventStatus::Upcoming);
    }

    #[test]
    fn test_interval_bounds_are_ongoing() {
        let start = t0();
        let end = t0() + Duration::hours(2);

        assert_eq!(derive_status(start, start, end, None), EventStatus::Ongoing);
        assert_eq!(derive_status(end, start, end, None), EventStatus::Ongoing);
        assert_eq!(
            derive_status(t0() + Duration::minutes(30), start, end, None),
            EventStatus::Ongoing
        );
    }

    #[test]
    fn test_after_end_is_past() {
        let start = t0() - Duration::hours(3);
        let end = t0() - Duration::hours(1);

        assert_eq!(derive_status(t0(), start, end, None), EventStatus::Past);
        assert_eq!(
            derive_status(end + Duration::milliseconds(1), start, end, None),
            EventStatus::Past
        );
    }

    #[test]
    fn test_timeline_partition_is_total() {
        let start = t0();
        let end = t0() + Duration::hours(1);

        for minutes in -120..=180 {
            let now = t0() + Duration::minutes(minutes);
            let expected = if now < start {
                EventStatus::Upcoming
            } else if now > end {
                EventStatus::Past
            } else {
                EventStatus::Ongoing
            };
            assert_eq!(derive_status(now, start, end, None), expected, "at {} min", minutes);
        }
    }

    #[test]
    fn test_zero_length_interval() {
        let at = t0();

        assert_eq!(status_at(at - Duration::seconds(1), at, at), EventStatus::Upcoming);
        assert_eq!(status_at(at, at, at), EventStatus::Ongoing);
        assert_eq!(status_at(at + Duration::seconds(1), at, at), EventStatus::Past);
    }

    #[test]
    fn test_cancelled_always_wins() {
        let start = t0() + Duration::hours(1);
        let end = t0() + Duration::hours(2);
        let cancelled = Some(RequestedStatus::Explicit(EventStatus::Cancelled));

        for hours in [-5, 0, 1, 2, 5] {
            let now = t0() + Duration::hours(hours);
            assert_eq!(derive_status(now, start, end, cancelled), EventStatus::Cancelled);
        }
    }

    #[test]
    fn test_recompute_after_end_is_past() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        let now = t0() + Duration::hours(3);

        assert_eq!(
            derive_status(now, start, end, Some(RequestedStatus::Recompute)),
            EventStatus::Past
        );
    }

    #[test]
    fn test_explicit_status_is_taken_as_is() {
        let start = t0() - Duration::hours(5);
        let end = t0() - Duration::hours(4);

        assert_eq!(
            derive_status(t0(), start, end, Some(RequestedStatus::Explicit(EventStatus::Upcoming))),
            EventStatus::Upcoming
        );
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let start = t0();
        let end = t0() + Duration::hours(1);
        let now = t0() + Duration::minutes(10);

        let first = derive_status(now, start, end, None);
        let second = derive_status(now, start, end, None);
        assert_eq!(first, second);
    }
}
