/*!
 * Tests for the HTML fragment filter
 */

use anyhow::Result;
use filterkit::resource::TagType;
use filterkit::resource::code::{TYPE_BOLD, TYPE_REFERENCE};

use crate::common;

const HTML: &str = "okf_html";

#[test]
fn test_extract_withBlocks_shouldCreateUnitPerBlock() -> Result<()> {
    let events = common::extract(HTML, "<p>One</p>\n<p>Two</p>")?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, "tu1");
    assert_eq!(units[0].source_fragment().text(), "One");
    assert_eq!(units[1].id, "tu2");
    assert_eq!(units[1].source_fragment().text(), "Two");
    Ok(())
}

#[test]
fn test_extract_withInlineTags_shouldCreatePairedCodes() -> Result<()> {
    let events = common::extract(HTML, "<p>Say <b>hello</b> now<br/></p>")?;
    let units = common::text_units(&events);
    let fragment = units[0].source_fragment();

    assert_eq!(fragment.text(), "Say hello now");
    let codes = fragment.codes();
    assert_eq!(codes.len(), 3);
    assert_eq!(codes[0].tag_type, TagType::Opening);
    assert_eq!(codes[0].code_type, TYPE_BOLD);
    assert_eq!(codes[1].tag_type, TagType::Closing);
    assert_eq!(codes[0].id, codes[1].id);
    assert_eq!(codes[2].tag_type, TagType::Placeholder);
    Ok(())
}

#[test]
fn test_extract_withEntities_shouldDecodeKnownOnes() -> Result<()> {
    let events = common::extract(HTML, "<p>Fish &amp; chips &#233;t&eacute;</p>")?;
    let units = common::text_units(&events);
    let fragment = units[0].source_fragment();

    assert_eq!(fragment.text(), "Fish & chips \u{e9}t");
    assert_eq!(fragment.codes()[0].code_type, TYPE_REFERENCE);
    assert_eq!(fragment.codes()[0].data, "&eacute;");
    Ok(())
}

#[test]
fn test_extract_withScript_shouldKeepBodyInSkeleton() -> Result<()> {
    let text = "<script>var s = \"<b>not text</b>\";</script><p>Text</p>";
    let events = common::extract(HTML, text)?;
    let units = common::text_units(&events);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source_fragment().text(), "Text");
    assert_eq!(common::roundtrip(HTML, text)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withCommentsAndAttributes_shouldBeIdentical() -> Result<()> {
    let text = "<!-- head -->\n<div class=\"box\">\n  <p>A <a href=\"x?a=1&amp;b=2\">link</a> &amp; more</p>\n</div>\n";
    assert_eq!(common::roundtrip(HTML, text)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withDecodedEntities_shouldWriteLiterals() -> Result<()> {
    let output = common::roundtrip(HTML, "<p>&quot;quoted&quot; &#65;</p>")?;
    assert_eq!(output, "<p>\"quoted\" A</p>");
    Ok(())
}
