use chrono::{DateTime, Duration, Utc};

use crate::models::Urgency;

/// Urgency tier from discount first, then time to expiry.
pub fn classify(discount: u8, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Urgency {
    if discount >= 50 {
        return Urgency::Today;
    }
    if discount >= 40 {
        return Urgency::LastUnits;
    }
    if discount >= 30 {
        return Urgency::Limited;
    }

    if let Some(expires_at) = expires_at {
        let remaining = expires_at - now;
        if remaining < Duration::hours(24) {
            return Urgency::Today;
        }
        if remaining < Duration::hours(72) {
            return Urgency::Limited;
        }
    }

    Urgency::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_discount_tiers() {
        assert_eq!(classify(50, None, now()), Urgency::Today);
        assert_eq!(classify(45, None, now()), Urgency::LastUnits);
        assert_eq!(classify(30, None, now()), Urgency::Limited);
        assert_eq!(classify(29, None, now()), Urgency::Normal);
    }

    #[test]
    fn test_expiry_tiers() {
        assert_eq!(classify(20, Some(now() + Duration::hours(5)), now()), Urgency::Today);
        assert_eq!(classify(20, Some(now() - Duration::hours(1)), now()), Urgency::Today);
        assert_eq!(classify(20, Some(now() + Duration::hours(24)), now()), Urgency::Limited);
        assert_eq!(classify(20, Some(now() + Duration::hours(71)), now()), Urgency::Limited);
        assert_eq!(classify(20, Some(now() + Duration::hours(72)), now()), Urgency::Normal);
    }

    #[test]
    fn test_discount_dominates_expiry() {
        let soon = Some(now() + Duration::hours(2));
        assert_eq!(classify(42, soon, now()), Urgency::LastUnits);
        assert_eq!(classify(35, soon, now()), Urgency::Limited);
        // deterministic
        assert_eq!(classify(35, soon, now()), classify(35, soon, now()));
    }
}
