use super::*;

#[test]
fn delay_doubles_until_cap() {
    let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 2.0, 5);
    assert_eq!(backoff.delay_for(1), Some(Duration::from_secs(1)));
    assert_eq!(backoff.delay_for(2), Some(Duration::from_secs(2)));
    assert_eq!(backoff.delay_for(3), Some(Duration::from_secs(4)));
    assert_eq!(backoff.delay_for(4), Some(Duration::from_secs(8)));
    assert_eq!(backoff.delay_for(5), Some(Duration::from_secs(10)));
}

#[test]
fn delay_is_none_past_max_retries() {
    let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 2.0, 3);
    assert_eq!(backoff.delay_for(4), None);
}

#[test]
fn delay_is_none_for_attempt_zero() {
    let backoff = Backoff::default();
    assert_eq!(backoff.delay_for(0), None);
}

#[test]
fn default_has_sane_bounds() {
    let backoff = Backoff::default();
    assert_eq!(backoff.max_retries(), 8);
}
