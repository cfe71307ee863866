/*!
 * Values parsed by a nested filter
 */

use anyhow::Result;
use filterkit::app_controller::pseudo_translate;
use filterkit::filters::{FilterConfigurationMapper, extract_all};
use filterkit::writer::{WriterOptions, write_to_vec};
use filterkit::{Event, RawDocument};
use serde_json::json;
use std::sync::Arc;

use crate::common;

const HTML_IN_PROPERTIES: &str = "okf_properties-html-subfilter";

#[test]
fn test_extract_withHtmlValue_shouldWrapNestedEvents() -> Result<()> {
    common::init_logging();
    let events = common::extract(HTML_IN_PROPERTIES, "greeting=<b>Hello</b> world\n")?;
    let kinds: Vec<String> = events.iter().map(|e| e.event_type().to_string()).collect();
    assert_eq!(
        kinds,
        vec![
            "START_DOCUMENT",
            "START_SUBFILTER",
            "TEXT_UNIT",
            "END_SUBFILTER",
            "DOCUMENT_PART",
            "END_DOCUMENT"
        ]
    );

    match &events[1] {
        Event::StartSubfilter(start) => {
            assert_eq!(start.id, "greeting_ssf1");
            assert_eq!(start.name, "sub-filter:greeting");
            assert_eq!(start.parent_id, "greeting");
            assert_eq!(start.mime_type, "text/html");
        }
        other => panic!("expected START_SUBFILTER, got {}", other.event_type()),
    }
    match &events[2] {
        Event::TextUnit(tu) => {
            assert_eq!(tu.id, "greeting_sf1_tu1");
            assert_eq!(tu.name.as_deref(), Some("greeting_1"));
            assert_eq!(tu.source_fragment().text(), "Hello world");
            assert_eq!(tu.source_fragment().codes().len(), 2);
        }
        other => panic!("expected TEXT_UNIT, got {}", other.event_type()),
    }
    assert_eq!(events[3].resource_id(), Some("greeting_esf1"));
    assert_eq!(events[4].resource_id(), Some("ref-sub-filter:greeting-1"));
    Ok(())
}

#[test]
fn test_extract_withSeveralValues_shouldNumberSections() -> Result<()> {
    common::init_logging();
    let events = common::extract(HTML_IN_PROPERTIES, "a=<i>one</i>\nb=two\n")?;
    let starts: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::StartSubfilter(start) => Some(start.id.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(starts, vec!["a_ssf1", "b_ssf2"]);
    let units: Vec<&str> = common::text_units(&events).into_iter().map(|tu| tu.id.as_str()).collect();
    assert_eq!(units, vec!["a_sf1_tu1", "b_sf2_tu1"]);
    Ok(())
}

#[test]
fn test_roundtrip_withEscapedHtmlValue_shouldReencodeForParent() -> Result<()> {
    common::init_logging();
    let text = "title=Caf\\u00e9 &amp; <b>cr\\u00e8me</b>\n";
    let events = common::extract(HTML_IN_PROPERTIES, text)?;
    let units = common::text_units(&events);
    assert_eq!(units[0].source_fragment().text(), "Caf\u{e9} & cr\u{e8}me");

    assert_eq!(String::from_utf8(common::write(&events)?)?, text);
    Ok(())
}

#[test]
fn test_roundtrip_withExtendedCharInTag_shouldEscapeForParent() -> Result<()> {
    common::init_logging();
    let escaped = "k=<a title=\"caf\\u00e9\">x</a>\n";
    assert_eq!(common::roundtrip(HTML_IN_PROPERTIES, escaped)?, escaped);

    let raw = "k=<a title=\"caf\u{e9}\">x</a>\n";
    assert_eq!(common::roundtrip(HTML_IN_PROPERTIES, raw)?, escaped);
    Ok(())
}

#[test]
fn test_write_withNestedTargets_shouldKeepCodes() -> Result<()> {
    common::init_logging();
    let mut events = common::extract(HTML_IN_PROPERTIES, "greeting=<b>Hello</b> world\n")?;
    for event in events.iter_mut() {
        if let Some(tu) = event.text_unit_mut() {
            pseudo_translate(tu, &common::fr());
        }
    }

    let options = WriterOptions {
        locale: Some(common::fr()),
        ..WriterOptions::default()
    };
    let output = write_to_vec(&events, options)?;
    assert_eq!(String::from_utf8(output)?, "greeting=<b>HELLO</b> WORLD\n");
    Ok(())
}

#[test]
fn test_extract_withPlainTextSubfilter_shouldUseLineIds() -> Result<()> {
    common::init_logging();
    let mut mapper = FilterConfigurationMapper::with_defaults();
    mapper.apply_overrides("okf_plaintext", &json!({ "subfilter": "okf_html" }))?;
    let mapper = Arc::new(mapper);

    let text = "<p>First</p>\n\n<em>Third</em> line\n";
    let mut filter = mapper.create_filter("okf_plaintext")?;
    let events = extract_all(filter.as_mut(), RawDocument::from_text(text, common::en()))?;

    let ids: Vec<&str> = events.iter().filter_map(Event::resource_id).collect();
    assert!(ids.contains(&"line1_ssf1"));
    assert!(ids.contains(&"line3_ssf2"));
    assert!(ids.contains(&"line3_sf2_tu1"));
    assert_eq!(String::from_utf8(common::write(&events)?)?, text);
    Ok(())
}
