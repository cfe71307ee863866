/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use filterkit::app_config::{Config, LineBreak, LogLevel};
use filterkit::encoding::NewlineType;
use serde_json::json;
use std::path::Path;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_locale, "en");
    assert_eq!(config.target_locale, "fr");
    assert_eq!(config.default_encoding, "UTF-8");
    assert_eq!(config.output_encoding, None);
    assert_eq!(config.line_break, LineBreak::Auto);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.filters.is_empty());
    assert!(config.extensions.is_empty());
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.source_locale = "".to_string();
    assert!(config.validate().is_err());
    config.source_locale = "en-US".to_string();
    assert!(config.validate().is_ok());

    config.target_locale = "fr-CANADA".to_string();
    assert!(config.validate().is_err());
    config.target_locale = "fr-CA".to_string();

    config.default_encoding = "no-such-encoding".to_string();
    assert!(config.validate().is_err());
    config.default_encoding = "windows-1252".to_string();
    assert!(config.validate().is_ok());

    config.output_encoding = Some("no-such-encoding".to_string());
    assert!(config.validate().is_err());
    config.output_encoding = Some("UTF-16LE".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_withBadFilterOverrides_shouldFail() {
    let mut config = Config::default();
    config
        .filters
        .insert("okf_nothing".to_string(), json!({ "trim_leading": true }));
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.filters.insert(
        "okf_plaintext".to_string(),
        json!({ "use_code_finder": true, "code_finder": { "rules": ["(unclosed"] } }),
    );
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config
        .filters
        .insert("okf_properties".to_string(), json!({ "subfilter": "okf_nothing" }));
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config
        .extensions
        .insert("msg".to_string(), "okf_nothing".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_build_mapper_withOverridesAndExtensions_shouldApplyBoth() -> Result<()> {
    let mut config = Config::default();
    config
        .filters
        .insert("okf_plaintext".to_string(), json!({ "trim_trailing": true }));
    config
        .extensions
        .insert("msg".to_string(), "okf_properties".to_string());

    let mapper = config.build_mapper()?;
    let params = &mapper
        .configuration("okf_plaintext")
        .expect("plain text configuration")
        .parameters;
    assert!(params.trim_trailing);
    assert!(params.preserve_whitespace);
    assert_eq!(mapper.config_for_path(Path::new("x.msg")), Some("okf_properties"));
    Ok(())
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefault() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("filterkit.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_locale, "fr");

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.source_locale, config.source_locale);
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "custom.json",
        r#"{ "source_locale": "de", "target_locale": "it", "line_break": "crlf", "log_level": "debug" }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.source_locale()?.to_string(), "de");
    assert_eq!(config.target_locale()?.to_string(), "it");
    assert_eq!(config.line_break.to_newline(), Some(NewlineType::CrLf));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.default_encoding, "UTF-8");
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_line_break_fromStr_shouldAcceptAnyCase() -> Result<()> {
    assert_eq!("CRLF".parse::<LineBreak>()?, LineBreak::CrLf);
    assert_eq!("auto".parse::<LineBreak>()?, LineBreak::Auto);
    assert!("unix".parse::<LineBreak>().is_err());
    Ok(())
}
