use chrono::NaiveDateTime;

/// Whether a recognition match is confident enough to accept a punch.
/// A miss is a negative outcome for the caller, not an error.
pub fn similarity_ok(similarity: f64, threshold: f64) -> bool {
    similarity >= threshold
}

/// Whether a new punch of some type falls inside the cooldown window of the
/// employee's previous log of that same type. Repeated camera frames arrive
/// seconds apart; anything inside the window is rejected as a duplicate.
pub fn in_cooldown(previous: NaiveDateTime, now: NaiveDateTime, cooldown_minutes: u32) -> bool {
    let elapsed = now - previous;
    elapsed < chrono::Duration::minutes(i64::from(cooldown_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn similarity_below_threshold_is_rejected() {
        assert!(!similarity_ok(0.90, 0.97));
    }

    #[test]
    fn similarity_at_threshold_is_accepted() {
        assert!(similarity_ok(0.97, 0.97));
        assert!(similarity_ok(0.99, 0.97));
    }

    #[test]
    fn punch_ten_minutes_after_previous_is_in_cooldown() {
        assert!(in_cooldown(ts(9, 0), ts(9, 10), 30));
    }

    #[test]
    fn punch_after_window_passes() {
        assert!(!in_cooldown(ts(9, 0), ts(9, 30), 30));
        assert!(!in_cooldown(ts(9, 0), ts(11, 0), 30));
    }
}
