//! Tests for filter parameter validation

use movement_analysis::{
    config::Config,
    filters::{create_filter, exponential::ExponentialFilter, AngleFilter},
    Error, ExerciseSession, ExerciseType,
};

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_zero_alpha() {
    let _ = ExponentialFilter::new(0.0);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_too_large_alpha() {
    let _ = ExponentialFilter::new(1.5);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_nan_alpha() {
    let _ = ExponentialFilter::new(f32::NAN);
}

#[test]
#[should_panic(expected = "Reference interval must be positive")]
fn test_exponential_zero_reference_interval() {
    let _ = ExponentialFilter::new(0.3).with_reference_interval(0.0);
}

#[test]
fn test_create_filter_validation() {
    // create_filter reports bad parameters instead of panicking
    assert!(create_filter("exponential:0", 0.3, 33.3).is_err());
    assert!(create_filter("exponential:1.5", 0.3, 33.3).is_err());
    assert!(create_filter("exponential:-0.2", 0.3, 33.3).is_err());
    assert!(create_filter("exponential", f32::NAN, 33.3).is_err());
    assert!(create_filter("exponential", 0.3, -1.0).is_err());
    assert!(create_filter("exponential", 0.3, f32::INFINITY).is_err());
    assert!(matches!(
        create_filter("hampel:5:3", 0.3, 33.3),
        Err(Error::ConfigError(_))
    ));

    // Valid parameters should work
    assert!(create_filter("none", 0.0, 0.0).is_ok());
    assert!(create_filter("exponential:1", 0.3, 33.3).is_ok());
    assert!(create_filter("EMA", 0.5, 10.0).is_ok());
}

#[test]
fn test_filter_names() {
    assert_eq!(create_filter("none", 0.3, 33.3).unwrap().name(), "NoFilter");
    assert_eq!(
        create_filter("exponential", 0.3, 33.3).unwrap().name(),
        "ExponentialFilter"
    );
    assert_eq!(ExponentialFilter::new(0.3).name(), "ExponentialFilter");
}

#[test]
fn test_session_rejects_bad_smoothing() {
    let mut config = Config::default();
    config.smoothing.alpha = 0.0;
    assert!(matches!(
        ExerciseSession::start(ExerciseType::Squat, config),
        Err(Error::ConfigError(_))
    ));

    let mut config = Config::default();
    config.smoothing.filter = "none".to_string();
    assert!(ExerciseSession::start(ExerciseType::Squat, config).is_ok());
}
