/*!
 * Tests for the Java properties filter
 */

use anyhow::Result;
use filterkit::Event;
use filterkit::resource::TagType;
use filterkit::resource::code::TYPE_CODE_FINDER;

use crate::common;

const PROPERTIES: &str = "okf_properties";

#[test]
fn test_extract_withCrLines_shouldCreateOneUnitPerEntry() -> Result<()> {
    let events = common::extract(PROPERTIES, "Key1=Text1\rKey2=Text2\r")?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, "1");
    assert_eq!(units[0].name.as_deref(), Some("Key1"));
    assert_eq!(units[0].source_fragment().text(), "Text1");
    assert_eq!(units[1].id, "2");
    assert_eq!(units[1].name.as_deref(), Some("Key2"));
    assert_eq!(units[1].source_fragment().text(), "Text2");
    Ok(())
}

#[test]
fn test_extract_withMessageFormatPlaceholders_shouldCreateCodes() -> Result<()> {
    let events = common::extract(PROPERTIES, "Key1={1}Text1{2}")?;
    let units = common::text_units(&events);
    assert_eq!(units.len(), 1);

    let fragment = units[0].source_fragment();
    assert_eq!(fragment.text(), "Text1");
    assert_eq!(fragment.codes().len(), 2);
    for (code, data) in fragment.codes().iter().zip(["{1}", "{2}"]) {
        assert_eq!(code.tag_type, TagType::Placeholder);
        assert_eq!(code.code_type, TYPE_CODE_FINDER);
        assert_eq!(code.data, data);
    }
    assert_eq!(fragment.to_original(), "{1}Text1{2}");
    Ok(())
}

#[test]
fn test_extract_withContinuationLine_shouldJoinValue() -> Result<()> {
    let events = common::extract(PROPERTIES, "Key2=Text2 \\\nSecond line")?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source_fragment().text(), "Text2 Second line");
    Ok(())
}

#[test]
fn test_extract_withSeparators_shouldAcceptColonAndSpace() -> Result<()> {
    let events = common::extract(PROPERTIES, "a:one\nb two\nc = three\n")?;
    let units = common::text_units(&events);

    let pairs: Vec<(Option<&str>, String)> = units
        .iter()
        .map(|tu| (tu.name.as_deref(), tu.source_fragment().text()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Some("a"), "one".to_string()),
            (Some("b"), "two".to_string()),
            (Some("c"), "three".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_extract_withComment_shouldAttachNote() -> Result<()> {
    let events = common::extract(PROPERTIES, "# Greeting shown at login\nhello=Hi\nbye=Bye\n")?;
    let units = common::text_units(&events);

    assert_eq!(units[0].note.as_deref(), Some("Greeting shown at login"));
    assert_eq!(units[1].note, None);
    Ok(())
}

#[test]
fn test_extract_withSkipDirective_shouldSkipNextEntryOnly() -> Result<()> {
    let events = common::extract(PROPERTIES, "#_skip\nkey1=Text1\nkey2=Text2\n")?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name.as_deref(), Some("key2"));
    Ok(())
}

#[test]
fn test_extract_withSkipBlock_shouldSkipUntilEnd() -> Result<()> {
    let text = "#_bskip\na=A\nb=B\n#_eskip\nc=C\n";
    let events = common::extract(PROPERTIES, text)?;
    let names: Vec<_> = common::text_units(&events)
        .iter()
        .filter_map(|tu| tu.name.clone())
        .collect();

    assert_eq!(names, vec!["c".to_string()]);
    assert_eq!(common::roundtrip(PROPERTIES, text)?, text);
    Ok(())
}

#[test]
fn test_extract_withEmptyValue_shouldCreateEmptyUnit() -> Result<()> {
    let text = "empty=\nfull=Value\n";
    let events = common::extract(PROPERTIES, text)?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, "1");
    assert_eq!(units[0].name.as_deref(), Some("empty"));
    assert!(units[0].source_fragment().is_empty());
    assert_eq!(units[1].id, "2");
    assert_eq!(common::roundtrip(PROPERTIES, text)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withEscapedBackslashCodePoint_shouldKeepEscape() -> Result<()> {
    let text = "Key=a\\u005cnb \\u005C\\u00e9\n";
    let events = common::extract(PROPERTIES, text)?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "a\\u005cnb \\u005C\u{e9}");
    assert_eq!(common::roundtrip(PROPERTIES, text)?, text);
    Ok(())
}

#[test]
fn test_extract_withUnicodeEscape_shouldDecodeValue() -> Result<()> {
    let events = common::extract(PROPERTIES, "city=Z\\u00fcrich\n")?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "Z\u{fc}rich");
    Ok(())
}

#[test]
fn test_extract_withEscapedNewline_shouldDecodeWhenConverting() -> Result<()> {
    let events = common::extract(PROPERTIES, "two=first\\nsecond\n")?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "first\nsecond");
    Ok(())
}

#[test]
fn test_extract_withTextUnit_shouldRecordValueStart() -> Result<()> {
    let events = common::extract(PROPERTIES, "a=1\nkey=value\n")?;
    let units = common::text_units(&events);

    assert_eq!(units[1].property("start"), Some("8"));
    Ok(())
}

#[test]
fn test_extract_withSkeleton_shouldHoldKeyAndBreak() -> Result<()> {
    let events = common::extract(PROPERTIES, "  key = value\n")?;
    let rendered = match &events[1] {
        Event::TextUnit(tu) => tu.skeleton.as_ref().map(|s| s.to_string()),
        other => panic!("expected a text unit, got {:?}", other.event_type()),
    };

    assert_eq!(rendered.as_deref(), Some("  key = [#$1]\n"));
    Ok(())
}

#[test]
fn test_roundtrip_withMixedContent_shouldBeIdentical() -> Result<()> {
    let text = "# Header\r\n\r\n! bang comment\r\nkey1 = Value {0} with {1}\r\nkey\\ with\\ space=Escaped \\: colon\r\nlast:no break";
    assert_eq!(common::roundtrip(PROPERTIES, text)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withUpperCaseEscape_shouldLowerCaseHex() -> Result<()> {
    assert_eq!(
        common::roundtrip(PROPERTIES, "city=Z\\u00FCrich\n")?,
        "city=Z\\u00fcrich\n"
    );
    Ok(())
}
