/*!
 * Tests for the plain text filter
 */

use anyhow::Result;
use filterkit::RawDocument;
use filterkit::filters::{FilterConfigurationMapper, extract_all};
use serde_json::json;
use std::sync::Arc;

use crate::common;

#[test]
fn test_extract_withBlankLines_shouldSkipThem() -> Result<()> {
    let events = common::extract("okf_plaintext", "first\n\n   \nsecond\n")?;
    let texts: Vec<String> = common::text_units(&events)
        .iter()
        .map(|tu| tu.source_fragment().text())
        .collect();

    assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    Ok(())
}

#[test]
fn test_extract_withDefaultConfig_shouldKeepWhitespace() -> Result<()> {
    let events = common::extract("okf_plaintext", "  padded  \n")?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "  padded  ");
    assert!(units[0].preserve_whitespace);
    Ok(())
}

#[test]
fn test_extract_withTrimConfigs_shouldMoveWhitespaceToSkeleton() -> Result<()> {
    let trail = common::extract("okf_plaintext_trim_trail", "  padded  \n")?;
    assert_eq!(common::text_units(&trail)[0].source_fragment().text(), "  padded");

    let all = common::extract("okf_plaintext_trim_all", "  padded  \n")?;
    assert_eq!(common::text_units(&all)[0].source_fragment().text(), "padded");

    assert_eq!(common::roundtrip("okf_plaintext_trim_all", "  padded  \n")?, "  padded  \n");
    Ok(())
}

#[test]
fn test_roundtrip_withMixedLineBreaks_shouldKeepEachBreak() -> Result<()> {
    let text = "one\r\ntwo\nthree\rfour";
    assert_eq!(common::roundtrip("okf_plaintext", text)?, text);
    Ok(())
}

#[test]
fn test_extract_withUnescapeSource_shouldDecodeAndReescape() -> Result<()> {
    let mut mapper = FilterConfigurationMapper::with_defaults();
    mapper.apply_overrides("okf_plaintext", &json!({ "unescape_source": true }))?;
    let mapper = Arc::new(mapper);

    let mut filter = mapper.create_filter("okf_plaintext")?;
    let document = RawDocument::from_text("tab\\there\nC:\\path\n", common::en());
    let events = extract_all(filter.as_mut(), document)?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "tab\there");
    assert_eq!(units[1].source_fragment().text(), "C:\\path");

    let output = String::from_utf8(common::write(&events)?)?;
    assert_eq!(output, "tab\\there\nC:\\\\path\n");
    Ok(())
}
