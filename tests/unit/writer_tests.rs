/*!
 * Tests for the skeleton writer
 */

use anyhow::Result;
use filterkit::encoding::NewlineType;
use filterkit::errors::FilterError;
use filterkit::resource::{TextContainer, TextFragment};
use filterkit::writer::{WriterOptions, write_to_vec};
use filterkit::{Event, FilterWriter};
use std::fs;

use crate::common;

fn translate_all(events: &mut [Event], text: &str) {
    for event in events.iter_mut() {
        if let Some(tu) = event.text_unit_mut() {
            tu.set_target(common::fr(), TextContainer::new(TextFragment::from_text(text)));
        }
    }
}

#[test]
fn test_write_withTargetLocale_shouldUseTargetContent() -> Result<()> {
    let mut events = common::extract("okf_properties", "# c\ngreeting=Hello\n")?;
    translate_all(&mut events, "Bonjour");

    let options = WriterOptions {
        locale: Some(common::fr()),
        ..WriterOptions::default()
    };
    let output = write_to_vec(&events, options)?;
    assert_eq!(String::from_utf8(output)?, "# c\ngreeting=Bonjour\n");
    Ok(())
}

#[test]
fn test_write_withMissingTarget_shouldFallBackToSource() -> Result<()> {
    let events = common::extract("okf_properties", "greeting=Hello\n")?;
    let options = WriterOptions {
        locale: Some(common::fr()),
        ..WriterOptions::default()
    };
    assert_eq!(write_to_vec(&events, options)?, b"greeting=Hello\n");
    Ok(())
}

#[test]
fn test_write_withExtendedTarget_shouldEscapeForProperties() -> Result<()> {
    let mut events = common::extract("okf_properties", "k=v\n")?;
    translate_all(&mut events, "\u{e9}t\u{e9}");

    let options = WriterOptions {
        locale: Some(common::fr()),
        ..WriterOptions::default()
    };
    assert_eq!(write_to_vec(&events, options)?, b"k=\\u00e9t\\u00e9\n");
    Ok(())
}

#[test]
fn test_write_withOutputEncoding_shouldEncodeBytes() -> Result<()> {
    let events = common::extract("okf_plaintext", "caf\u{e9}\n")?;
    let options = WriterOptions {
        encoding: Some("ISO-8859-1".to_string()),
        ..WriterOptions::default()
    };
    assert_eq!(write_to_vec(&events, options)?, b"caf\xe9\n");
    Ok(())
}

#[test]
fn test_write_withUtf8Bom_shouldKeepBom() -> Result<()> {
    let input = b"\xef\xbb\xbfkey=value\n";
    let events = common::extract_bytes("okf_properties", input)?;
    assert_eq!(common::write(&events)?, input);
    Ok(())
}

#[test]
fn test_write_withLineBreakOverride_shouldNormalizeSkeleton() -> Result<()> {
    let events = common::extract("okf_plaintext", "a\r\nb\r\n\r\nc")?;
    let options = WriterOptions {
        line_break: Some(NewlineType::Lf),
        ..WriterOptions::default()
    };
    assert_eq!(write_to_vec(&events, options)?, b"a\nb\n\nc");
    Ok(())
}

#[test]
fn test_write_withUnknownReference_shouldFail() -> Result<()> {
    let mut events = common::extract("okf_plaintext", "a\n")?;
    for event in events.iter_mut() {
        if let Some(skeleton) = event.text_unit_mut().and_then(|tu| tu.skeleton.as_mut()) {
            skeleton.add_reference("nowhere");
        }
    }

    let result = write_to_vec(&events, WriterOptions::default());
    assert!(matches!(result, Err(FilterError::MissingReference(id)) if id == "nowhere"));
    Ok(())
}

#[test]
fn test_write_withEventBeforeStart_shouldFail() -> Result<()> {
    let events = common::extract("okf_plaintext", "a\n")?;
    let result = write_to_vec(&events[1..], WriterOptions::default());
    assert!(matches!(result, Err(FilterError::StructuralMismatch(_))));
    Ok(())
}

#[test]
fn test_write_withPathOutput_shouldCreateFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.txt");
    let events = common::extract("okf_plaintext", "line one\nline two\n")?;

    let mut writer = FilterWriter::new();
    writer.set_output(&path);
    for event in &events {
        writer.handle_event(event)?;
    }
    writer.close();

    assert_eq!(fs::read_to_string(&path)?, "line one\nline two\n");
    Ok(())
}

#[test]
fn test_write_withCanceledEvent_shouldDiscardOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.txt");
    let events = common::extract("okf_plaintext", "line one\nline two\n")?;

    let mut writer = FilterWriter::new();
    writer.set_output(&path);
    writer.handle_event(&events[0])?;
    writer.handle_event(&events[1])?;
    writer.handle_event(&Event::Canceled)?;
    writer.close();

    assert!(!path.exists());
    Ok(())
}
