use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// First hour of normal parking.
pub const BASE_RATE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
/// Every started hour after the first.
pub const HOURLY_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
/// Flat rate when the ticket was opened as overnight parking.
pub const OVERNIGHT_RATE: Decimal = Decimal::from_parts(250, 0, 0, false, 0);
/// Surcharge per recorded violation.
pub const VIOLATION_FEE: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// The due amount of an unpaid ticket at quote time, with the display
/// breakdown the client prints on the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub total: Decimal,
    pub price_calculation: String,
    pub violation_line: String,
}

/// Prices a ticket: overnight is a flat rate, otherwise base rate plus an
/// hourly increment for every started hour after the first. Violations add
/// a flat fee each in either mode.
pub fn quote(
    date_occupied: DateTime<Utc>,
    now: DateTime<Utc>,
    is_overnight: bool,
    violations: i64,
) -> Quote {
    let (parking_fee, price_calculation) = if is_overnight {
        (OVERNIGHT_RATE, "= PHP 250.00".to_string())
    } else {
        let extra_hours = billable_hours(date_occupied, now).saturating_sub(1).max(0);
        let fee = BASE_RATE + HOURLY_RATE * Decimal::from(extra_hours);
        (
            fee,
            format!(
                "= PHP 100.00 base rate\n+ ({} hours x PHP 50.00)",
                extra_hours
            ),
        )
    };

    let violations = violations.max(0);
    Quote {
        total: parking_fee + VIOLATION_FEE * Decimal::from(violations),
        price_calculation,
        violation_line: format!("= {} violation/s x PHP 200", violations),
    }
}

/// Started hours between occupation and now. A non-positive duration still
/// bills the base hour.
fn billable_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let seconds = (to - from).num_seconds();
    if seconds <= 0 {
        return 1;
    }
    (seconds + 3599) / 3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn now() -> DateTime<Utc> {
        "2024-05-04T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn first_hour_bills_the_base_rate_only() {
        let q = quote(now() - Duration::minutes(25), now(), false, 0);
        assert_eq!(q.total, dec(100));
        assert_eq!(
            q.price_calculation,
            "= PHP 100.00 base rate\n+ (0 hours x PHP 50.00)"
        );
    }

    #[test]
    fn each_started_hour_after_the_first_adds_fifty() {
        // 1h01m has started a second hour.
        let q = quote(now() - Duration::minutes(61), now(), false, 0);
        assert_eq!(q.total, dec(150));

        let q = quote(now() - Duration::hours(5), now(), false, 0);
        assert_eq!(q.total, dec(300));
        assert_eq!(
            q.price_calculation,
            "= PHP 100.00 base rate\n+ (4 hours x PHP 50.00)"
        );
    }

    #[test]
    fn exact_hour_boundaries_do_not_start_a_new_hour() {
        let q = quote(now() - Duration::hours(2), now(), false, 0);
        assert_eq!(q.total, dec(150));
    }

    #[test]
    fn overnight_is_a_flat_rate_regardless_of_duration() {
        let q = quote(now() - Duration::hours(14), now(), true, 0);
        assert_eq!(q.total, dec(250));
        assert_eq!(q.price_calculation, "= PHP 250.00");

        let q = quote(now() - Duration::minutes(5), now(), true, 0);
        assert_eq!(q.total, dec(250));
    }

    #[test]
    fn violations_surcharge_applies_in_both_modes() {
        let q = quote(now() - Duration::minutes(30), now(), false, 3);
        assert_eq!(q.total, dec(100 + 3 * 200));
        assert_eq!(q.violation_line, "= 3 violation/s x PHP 200");

        let q = quote(now() - Duration::hours(10), now(), true, 1);
        assert_eq!(q.total, dec(250 + 200));
    }

    #[test]
    fn clock_skew_still_bills_the_base_hour() {
        let q = quote(now() + Duration::minutes(10), now(), false, 0);
        assert_eq!(q.total, dec(100));
    }
}
