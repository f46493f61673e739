use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Timestamps are stored in UTC and rendered in the site's fixed-offset
/// local zone, `YYYY/MM/DD hh:mm:ss AM|PM`.
pub fn format_display(t: DateTime<Utc>, offset: FixedOffset) -> String {
    t.with_timezone(&offset)
        .format("%Y/%m/%d %I:%M:%S %p")
        .to_string()
}

pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
}

/// The calendar date `t` falls on in the site's local zone.
pub fn local_date(t: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    t.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight, `days_back` local days before `now`.
/// Revenue and visitor counters bucket on these boundaries.
pub fn local_day_start(now: DateTime<Utc>, offset: FixedOffset, days_back: i64) -> DateTime<Utc> {
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    let local = now.naive_utc() + shift;
    let midnight = (local.date() - Duration::days(days_back)).and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(midnight - shift))
}

/// Half-open UTC range covering one local day: `days_back = 0` is today,
/// `1` is yesterday.
pub fn local_day_range(
    now: DateTime<Utc>,
    offset: FixedOffset,
    days_back: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_day_start(now, offset, days_back);
    (start, start + Duration::days(1))
}

/// Humanized elapsed time for the dashboard activity feed.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n > 1 {
            format!("{} {}s ago", n, unit)
        } else {
            format!("{} {} ago", n, unit)
        }
    }

    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return plural(seconds, "second");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    plural(days / 365, "year")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn plus8() -> FixedOffset {
        offset_from_hours(8).unwrap()
    }

    #[test]
    fn display_format_uses_local_offset_and_am_pm() {
        // 18:05 UTC is 02:05 AM the next day at UTC+8.
        let t = utc("2024-05-03T18:05:09Z");
        assert_eq!(format_display(t, plus8()), "2024/05/04 02:05:09 AM");
    }

    #[test]
    fn local_date_rolls_over_at_local_midnight() {
        let before = utc("2024-05-03T15:59:59Z"); // 23:59:59 local
        let after = utc("2024-05-03T16:00:00Z"); // 00:00:00 local, next day
        assert_eq!(
            local_date(before, plus8()),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
        );
        assert_eq!(
            local_date(after, plus8()),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
        );
    }

    #[test]
    fn day_range_is_local_midnight_to_midnight_in_utc() {
        let now = utc("2024-05-04T01:30:00Z"); // 09:30 local on May 4
        let (start, end) = local_day_range(now, plus8(), 0);
        assert_eq!(start, utc("2024-05-03T16:00:00Z"));
        assert_eq!(end, utc("2024-05-04T16:00:00Z"));

        let (y_start, y_end) = local_day_range(now, plus8(), 1);
        assert_eq!(y_start, utc("2024-05-02T16:00:00Z"));
        assert_eq!(y_end, y_start + Duration::days(1));
    }

    #[test]
    fn time_ago_picks_the_largest_fitting_unit() {
        let now = utc("2024-05-04T12:00:00Z");
        assert_eq!(time_ago(now - Duration::seconds(1), now), "1 second ago");
        assert_eq!(time_ago(now - Duration::seconds(59), now), "59 seconds ago");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(time_ago(now - Duration::days(29), now), "29 days ago");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn time_ago_never_goes_negative() {
        let now = utc("2024-05-04T12:00:00Z");
        assert_eq!(time_ago(now + Duration::seconds(30), now), "0 second ago");
    }
}
