//! Unit tests for ttl encoding and the defaults record

use std::time::Duration;

use crate::notifications::api::{MessageOptions, RegistryDefaults, Ttl};

#[test]
fn test_ttl_deserializes_from_millisecond_integers() {
    let ttl: Ttl = serde_json::from_str("3000").unwrap();
    assert_eq!(ttl, Ttl::After(Duration::from_millis(3000)));

    let ttl: Ttl = serde_json::from_str("0").unwrap();
    assert_eq!(ttl, Ttl::After(Duration::ZERO));
}

#[test]
fn test_ttl_minus_one_means_never() {
    let ttl: Ttl = serde_json::from_str("-1").unwrap();
    assert_eq!(ttl, Ttl::Never);

    assert_eq!(serde_json::to_string(&Ttl::Never).unwrap(), "-1");
    assert_eq!(serde_json::to_string(&Ttl::millis(250)).unwrap(), "250");
}

#[test]
fn test_ttl_rejects_other_negative_values() {
    assert!(serde_json::from_str::<Ttl>("-2").is_err());
}

#[test]
fn test_options_distinguish_absent_from_zero() {
    let absent: MessageOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(absent.ttl, None);

    let zero: MessageOptions = serde_json::from_str(r#"{"ttl": 0}"#).unwrap();
    assert_eq!(zero.ttl, Some(Ttl::After(Duration::ZERO)));
}

#[test]
fn test_defaults_fill_missing_config_fields() {
    let defaults: RegistryDefaults = serde_json::from_str(r#"{"ttl": -1}"#).unwrap();
    assert_eq!(defaults.ttl, Ttl::Never);
    assert_eq!(defaults.severity, "error");
    assert!(!defaults.message.is_empty());
}
