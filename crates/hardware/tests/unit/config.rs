//! # Configuration Tests
//!
//! Defaults, JSON deserialization and validation of `Config`.

use msisim_core::common::error::ConfigError;
use msisim_core::config::{Config, WritePolicy};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.block_words, 1);
    assert_eq!(config.data_words, 1024);
    assert_eq!(config.miss_penalty, 100);
    assert_eq!(config.associativity, 1);
    assert_eq!(config.write_policy, WritePolicy::WriteThrough);
    assert_eq!(config.cores, 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_takes_defaults() {
    let config = Config::from_json(r#"{ "associativity": 4, "write_policy": "B" }"#).unwrap();
    assert_eq!(
        config,
        Config {
            associativity: 4,
            write_policy: WritePolicy::WriteBack,
            ..Config::default()
        }
    );
}

#[test]
fn test_write_policy_long_names_accepted() {
    let config = Config::from_json(r#"{ "write_policy": "WriteBack" }"#).unwrap();
    assert_eq!(config.write_policy, WritePolicy::WriteBack);
}

#[test]
fn test_malformed_json_is_rejected() {
    let err = Config::from_json(r#"{ "cores": "four" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed(_)));
    assert_eq!(err.exit_code(), 7);
}

#[rstest]
#[case("T", WritePolicy::WriteThrough)]
#[case("B", WritePolicy::WriteBack)]
fn test_write_policy_flag(#[case] flag: &str, #[case] expected: WritePolicy) {
    assert_eq!(flag.parse::<WritePolicy>().unwrap(), expected);
    assert_eq!(expected.as_char().to_string(), flag);
}

#[rstest]
#[case("t")]
#[case("X")]
#[case("")]
fn test_unknown_write_policy(#[case] flag: &str) {
    let err = flag.parse::<WritePolicy>().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidWritePolicy(_)));
    assert_eq!(err.exit_code(), 6);
}

#[rstest]
#[case::block(Config { block_words: 3, ..Config::default() }, 3)]
#[case::block_zero(Config { block_words: 0, ..Config::default() }, 3)]
#[case::penalty(Config { miss_penalty: 0, ..Config::default() }, 4)]
#[case::data(Config { data_words: 1000, ..Config::default() }, 5)]
#[case::associativity(Config { associativity: 3, ..Config::default() }, 8)]
#[case::cores(Config { cores: 3, ..Config::default() }, 9)]
#[case::cores_zero(Config { cores: 0, ..Config::default() }, 9)]
#[case::block_too_big(Config { block_words: 2048, ..Config::default() }, 10)]
#[case::too_many_ways(Config { data_words: 4, associativity: 8, ..Config::default() }, 11)]
fn test_validation_exit_codes(#[case] config: Config, #[case] code: i32) {
    let err = config.validate().unwrap_err();
    assert_eq!(err.exit_code(), code, "{err}");
}

#[test]
fn test_validation_reports_first_violation() {
    let config = Config {
        block_words: 3,
        data_words: 7,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::BlockSizeNotPowerOfTwo(3))
    ));
}

#[test]
fn test_single_core_is_valid() {
    let config = Config {
        cores: 1,
        ..Config::default()
    };
    assert!(config.validate().is_ok());
}
