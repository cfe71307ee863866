/*!
 * Tests for the DTD filter
 */

use anyhow::Result;
use filterkit::errors::FilterError;
use filterkit::Event;

use crate::common;

const DTD: &str = "okf_dtd";

#[test]
fn test_extract_withEntity_shouldNameUnitAfterEntity() -> Result<()> {
    let events = common::extract(DTD, "<!ENTITY name \"value\">")?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name.as_deref(), Some("name"));
    assert_eq!(units[0].source_fragment().text(), "value");
    let skeleton = units[0].skeleton.as_ref().map(|s| s.to_string());
    assert_eq!(skeleton.as_deref(), Some("<!ENTITY name \"[#$1]\">"));
    Ok(())
}

#[test]
fn test_extract_withComment_shouldAttachNote() -> Result<()> {
    let text = "<!-- Window title -->\n<!ENTITY title 'Main window'>\n<!ENTITY other \"Other\">\n";
    let events = common::extract(DTD, text)?;
    let units = common::text_units(&events);

    assert_eq!(units[0].note.as_deref(), Some("Window title"));
    assert_eq!(units[1].note, None);
    assert_eq!(common::roundtrip(DTD, text)?, text);
    Ok(())
}

#[test]
fn test_extract_withParameterEntity_shouldKeepItInSkeleton() -> Result<()> {
    let text = "<!ENTITY % brand SYSTEM \"brand.dtd\">\n%brand;\n<!ELEMENT p (#PCDATA)>\n<!ENTITY hello \"Hello &brandName;\">\n";
    let events = common::extract(DTD, text)?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source_fragment().text(), "Hello ");
    assert_eq!(units[0].source_fragment().codes()[0].data, "&brandName;");
    assert_eq!(common::roundtrip(DTD, text)?, text);
    Ok(())
}

#[test]
fn test_extract_withReferenceOnlyValue_shouldNotCreateUnit() -> Result<()> {
    let events = common::extract(DTD, "<!ENTITY copy \"&other;\">")?;
    assert!(common::text_units(&events).is_empty());
    Ok(())
}

#[test]
fn test_roundtrip_withCharacterReferences_shouldNormalize() -> Result<()> {
    let output = common::roundtrip(DTD, "<!ENTITY a \"x &gt; y &#65;\">\n")?;
    assert_eq!(output, "<!ENTITY a \"x > y A\">\n");
    Ok(())
}

#[test]
fn test_roundtrip_withNumericQuoteReferences_shouldKeepDelimiters() -> Result<()> {
    let text = "<!ENTITY a \"say &#34;hi&#x22; now\">\n<!ENTITY b 'it&#39;s &#x27;ok&#X27;'>\n";
    let events = common::extract(DTD, text)?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().text(), "say hi now");
    let data: Vec<&str> = units[0].source_fragment().codes().iter().map(|c| c.data.as_str()).collect();
    assert_eq!(data, vec!["&#34;", "&#x22;"]);
    assert_eq!(units[1].source_fragment().codes().len(), 3);
    assert_eq!(common::roundtrip(DTD, text)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withAmpersand_shouldKeepReference() -> Result<()> {
    let text = "<!ENTITY a \"Tom &amp; Jerry\">\n";
    assert_eq!(common::roundtrip(DTD, text)?, text);
    Ok(())
}

#[test]
fn test_extract_withUnterminatedDeclaration_shouldReportLine() {
    let result = common::extract(DTD, "<!ENTITY a \"ok\">\n\n<!ENTITY b \"never closed");
    let error = result.expect_err("unterminated declaration must fail");

    match error.downcast_ref::<FilterError>() {
        Some(FilterError::Grammar { line, .. }) => assert_eq!(*line, 3),
        other => panic!("expected a grammar error, got {:?}", other),
    }
}

#[test]
fn test_extract_withDocument_shouldStartAndEndOnce() -> Result<()> {
    let events = common::extract(DTD, "<!ENTITY a \"A\">")?;
    assert!(matches!(events.first(), Some(Event::StartDocument(_))));
    assert!(matches!(events.last(), Some(Event::EndDocument(_))));
    Ok(())
}
