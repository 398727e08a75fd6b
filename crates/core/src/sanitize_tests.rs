use super::*;

#[test]
fn finite_values_pass_through() {
    assert_eq!(sanitize_f64(1.5), 1.5);
    assert_eq!(sanitize_f64(0.0), 0.0);
}

#[test]
fn nan_becomes_zero() {
    assert_eq!(sanitize_f64(f64::NAN), 0.0);
}

#[test]
fn infinities_become_zero() {
    assert_eq!(sanitize_f64(f64::INFINITY), 0.0);
    assert_eq!(sanitize_f64(f64::NEG_INFINITY), 0.0);
}
