/*!
 * Tests for locale identifiers
 */

use anyhow::Result;
use filterkit::LocaleId;

#[test]
fn test_parse_withRegionVariants_shouldNormalize() -> Result<()> {
    let locale = LocaleId::parse("pt_br")?;
    assert_eq!(locale.language(), "pt");
    assert_eq!(locale.region(), Some("BR"));
    assert_eq!(locale.to_string(), "pt-BR");

    let locale: LocaleId = "es-419".parse()?;
    assert_eq!(locale.region(), Some("419"));
    Ok(())
}

#[test]
fn test_parse_withInvalidValues_shouldFail() {
    for value in ["", "   ", "q", "en-USA1", "en-US-x", "und"] {
        assert!(LocaleId::parse(value).is_err(), "'{}' should be rejected", value);
    }
}

#[test]
fn test_same_language_withTwoAndThreeLetterCodes_shouldMatch() -> Result<()> {
    let fr = LocaleId::parse("fr")?;
    assert!(fr.same_language(&LocaleId::parse("fre")?));
    assert!(fr.same_language(&LocaleId::parse("fr-CA")?));
    assert!(!fr.same_language(&LocaleId::parse("de")?));
    assert_eq!(fr.language_name(), "French");
    Ok(())
}

#[test]
fn test_serde_withString_shouldRoundTripAsText() -> Result<()> {
    let locale = LocaleId::parse("de-CH")?;
    let json = serde_json::to_string(&locale)?;
    assert_eq!(json, "\"de-CH\"");

    let back: LocaleId = serde_json::from_str(&json)?;
    assert_eq!(back, locale);
    assert!(serde_json::from_str::<LocaleId>("\"zz-invalid\"").is_err());
    Ok(())
}
