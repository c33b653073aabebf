/// Feeds mix second and millisecond timestamps. Picks whichever reading
/// lands closer to `now_ms` and returns it in milliseconds. Zero stays zero.
pub fn normalize_timestamp(value: i64, now_ms: i64) -> i64 {
    if value == 0 {
        return 0;
    }
    let as_seconds = value.saturating_mul(1000);
    let diff_millis = now_ms.saturating_sub(value).unsigned_abs();
    let diff_seconds = now_ms.saturating_sub(as_seconds).unsigned_abs();
    if diff_millis < diff_seconds {
        value
    } else {
        as_seconds
    }
}

#[test]
fn keeps_millisecond_timestamps() {
    let now = 1_740_312_000_000;
    assert_eq!(normalize_timestamp(now - 1000, now), now - 1000);
}

#[test]
fn converts_second_timestamps() {
    let now = 1_740_312_000_000;
    assert_eq!(normalize_timestamp(now / 1000 - 1, now), now - 1000);
}

#[test]
fn zero_stays_zero() {
    assert_eq!(normalize_timestamp(0, 1_740_312_000_000), 0);
}

#[test]
fn extreme_values_do_not_overflow() {
    let now = 1_740_312_000_000;
    assert_eq!(normalize_timestamp(i64::MIN, now), i64::MIN);
    assert_eq!(normalize_timestamp(i64::MAX, now), i64::MAX);
    assert_eq!(normalize_timestamp(i64::MIN, i64::MAX), i64::MIN);
}
