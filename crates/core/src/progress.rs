//! Progress arithmetic for the processing pipeline.
//!
//! The mesh service reports cumulative `current/total` counts. These
//! helpers keep the stored counter monotonic under duplicated or
//! reordered callbacks and turn counts into the integer percentage the
//! API and WebSocket clients consume.

/// Percentage as stored/transmitted: an integer in `0..=100`.
pub type Percent = i16;

/// Compute the integer completion percentage for `completed` of `total`.
///
/// Returns 0 when `total` is 0 (total unknown before extraction), and
/// clamps the result into `0..=100` so an over-reporting service can
/// never push the percentage past 100.
pub fn percent(completed: i32, total: i32) -> Percent {
    if total <= 0 {
        return 0;
    }
    let pct = (f64::from(completed.max(0)) / f64::from(total) * 100.0).round() as i64;
    pct.clamp(0, 100) as Percent
}

/// Clamp a cumulative progress report onto the stored counter.
///
/// The service reports how many units are done in total (`reported`);
/// the result never decreases below the already-stored `completed` and
/// never exceeds `total` once the total is known. Duplicate or
/// out-of-order callbacks therefore cannot move the counter backwards.
///
/// This is the reference form of the clamp. Production updates apply
/// the same expression in SQL (`ProjectRepo::record_progress` in
/// spinelift-db) so the read-modify-write happens in one statement;
/// keep the two in sync.
pub fn clamp_completed(completed: i32, total: i32, reported: i32) -> i32 {
    let ceiling = if total > 0 { total } else { i32::MAX };
    completed.max(reported.clamp(0, ceiling))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- percent --------------------------------------------------------------

    #[test]
    fn percent_zero_total_is_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn percent_rounds_to_nearest_integer() {
        // 1/3 -> 33.33 -> 33, 2/3 -> 66.67 -> 67
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn percent_clamps_overflow() {
        assert_eq!(percent(7, 5), 100);
        assert_eq!(percent(-1, 5), 0);
    }

    #[test]
    fn percent_is_monotonic_over_a_run() {
        let total = 7;
        let mut last = percent(0, total);
        for done in 1..=total {
            let p = percent(done, total);
            assert!(p >= last, "percentage decreased at {done}/{total}");
            last = p;
        }
        assert_eq!(last, 100);
    }

    // -- clamp_completed ------------------------------------------------------

    #[test]
    fn clamp_applies_cumulative_report() {
        assert_eq!(clamp_completed(1, 5, 3), 3);
    }

    #[test]
    fn clamp_never_decreases() {
        // A duplicate or reordered callback reports a smaller cumulative count.
        assert_eq!(clamp_completed(4, 5, 2), 4);
        assert_eq!(clamp_completed(4, 5, 4), 4);
    }

    #[test]
    fn clamp_caps_at_total() {
        assert_eq!(clamp_completed(3, 5, 9), 5);
    }

    #[test]
    fn clamp_ignores_negative_reports() {
        assert_eq!(clamp_completed(2, 5, -1), 2);
    }

    #[test]
    fn clamp_without_known_total_accepts_report() {
        // total_layers is 0 before extraction returns.
        assert_eq!(clamp_completed(0, 0, 2), 2);
    }
}
