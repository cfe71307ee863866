/*!
 * Extract-then-write scenarios across the built-in filters
 */

use anyhow::Result;
use filterkit::RawDocument;
use filterkit::event::NestingValidator;
use filterkit::roundtrip::RoundTripHarness;

use crate::common;

fn harness() -> RoundTripHarness {
    RoundTripHarness::new(common::mapper())
}

fn run(config_id: &str, text: &str) -> Result<filterkit::roundtrip::RoundTripReport> {
    let document = RawDocument::from_text(text, common::en());
    Ok(harness().run(config_id, document)?)
}

#[test]
fn test_roundtrip_withCrPropertiesFile_shouldBeIdentical() -> Result<()> {
    let report = run("okf_properties", "Key1=Text1\rKey2=Text2\r")?;

    assert_eq!(report.text_units, 2);
    assert!(report.is_identical(), "{:?}", report.mismatch);
    assert_eq!(report.input_len, report.output_len);
    Ok(())
}

#[test]
fn test_roundtrip_withPlaceholders_shouldKeepThemAsCodes() -> Result<()> {
    let text = "Key1={1}Text1{2}";
    let events = common::extract("okf_properties", text)?;
    let units = common::text_units(&events);

    assert_eq!(units[0].source_fragment().codes().len(), 2);
    assert_eq!(String::from_utf8(common::write(&events)?)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withContinuation_shouldJoinOnOneLine() -> Result<()> {
    let report = run("okf_properties", "Key2=Text2 \\\nSecond line")?;

    assert_eq!(report.text_units, 1);
    let mismatch = report.mismatch.expect("joined value is written on one line");
    assert_eq!(mismatch.offset, 11);

    let output = common::roundtrip("okf_properties", "Key2=Text2 \\\nSecond line")?;
    assert_eq!(output, "Key2=Text2 Second line");
    Ok(())
}

#[test]
fn test_roundtrip_withDtdEntity_shouldBeIdentical() -> Result<()> {
    let text = "<!ENTITY name \"value\">";
    let report = run("okf_dtd", text)?;

    assert_eq!(report.text_units, 1);
    assert!(report.is_identical());
    Ok(())
}

#[test]
fn test_roundtrip_withTransTableRow_shouldBeIdentical() -> Result<()> {
    let text = "TransTableV1\ten\tfr\n\"okpCtx:tu=1\"\t\"source\"\t\"target\"\n";
    let report = run("okf_transtable", text)?;

    assert_eq!(report.text_units, 1);
    assert!(report.is_identical(), "{:?}", report.mismatch);
    Ok(())
}

#[test]
fn test_roundtrip_withEveryFilter_shouldProduceValidNesting() -> Result<()> {
    let samples = [
        ("okf_properties", "# c\na=A {0}\nb=B\n"),
        ("okf_plaintext", "one\n\ntwo"),
        ("okf_dtd", "<!-- n -->\n<!ENTITY a \"A &b;\">\n"),
        ("okf_transtable", "TransTableV1\ten\tfr\n\"okpCtx:tu=1:s=0\"\t\"x\"\n"),
        ("okf_html", "<p>A <i>b</i></p>\n<ul><li>c</li></ul>"),
        ("okf_properties-html-subfilter", "k=<b>v</b> w\n"),
    ];
    for (config_id, text) in samples {
        let events = common::extract(config_id, text)?;
        NestingValidator::validate(&events)?;

        let report = run(config_id, text)?;
        assert!(report.is_identical(), "{}: {:?}", config_id, report.mismatch);
        assert_eq!(report.config_id, config_id);
    }
    Ok(())
}

#[test]
fn test_roundtrip_withWindows1252Input_shouldKeepBytes() -> Result<()> {
    let bytes = b"caf\xe9 au lait\r\nna\xefve\r\n".to_vec();
    let document = RawDocument::from_bytes(bytes.clone(), "windows-1252", common::en());
    let report = harness().run("okf_plaintext", document)?;

    assert!(report.is_identical(), "{:?}", report.mismatch);
    assert_eq!(report.output_len, bytes.len());
    Ok(())
}
