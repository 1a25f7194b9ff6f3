//! Chronos session tokens.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW: TimeDelta = TimeDelta::seconds(30);

/// An `auth_key` and the instant after which it must not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SessionToken {
    auth_key: String,
    usable_until: DateTime<Utc>,
}

impl SessionToken {
    /// Token issued at `now`, valid for `ttl`.
    ///
    /// The expiry skew never exceeds half the TTL, so short-lived sessions
    /// are still reused.
    pub(super) fn issue(auth_key: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let skew = EXPIRY_SKEW.min(ttl / 2);
        let usable_until = now
            .checked_add_signed(ttl - skew)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            auth_key,
            usable_until,
        }
    }

    pub(super) fn auth_key(&self) -> &str {
        &self.auth_key
    }

    /// True while the token can still be sent at `now`.
    pub(super) fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.usable_until
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0)
            .single()
            .expect("instant")
    }

    #[rstest]
    #[case(3_600, 0, true)]
    #[case(3_600, 3_000, true)]
    #[case(3_600, 3_569, true)]
    #[case(3_600, 3_570, false)]
    #[case(3_600, 7_200, false)]
    #[case(30, 14, true)]
    #[case(30, 15, false)]
    #[case(10, 4, true)]
    #[case(10, 5, false)]
    #[case(0, 0, false)]
    fn usability_honours_ttl_and_skew(
        #[case] ttl_secs: u64,
        #[case] elapsed_secs: i64,
        #[case] usable: bool,
    ) {
        let token =
            SessionToken::issue("k".to_owned(), issued_at(), Duration::from_secs(ttl_secs));
        let now = issued_at() + TimeDelta::seconds(elapsed_secs);
        assert_eq!(token.is_usable(now), usable);
    }

    #[rstest]
    fn huge_ttl_saturates() {
        let token = SessionToken::issue("k".to_owned(), issued_at(), Duration::MAX);
        assert!(token.is_usable(issued_at() + TimeDelta::days(365 * 100)));
    }
}
