/*!
 * Batch processing over files and directories
 */

use anyhow::Result;
use filterkit::app_config::{Config, LineBreak};
use filterkit::app_controller::{Controller, Operation};
use std::fs;
use std::path::Path;

use crate::common;

fn populate(dir: &Path) -> Result<()> {
    common::create_test_file(dir, "app.properties", "# UI\ngreeting=Hello {0}\nbye=Bye\n")?;
    common::create_test_file(dir, "notes.txt", "first line\r\nsecond line\r\n")?;
    common::create_test_file(dir, "strings.dtd", "<!ENTITY title \"Main &amp; more\">\n")?;
    common::create_test_file(dir, "ignored.bin", "binary")?;
    Ok(())
}

#[test]
fn test_run_batch_withRoundTrip_shouldReportEachDocument() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    populate(temp_dir.path())?;
    common::create_test_file(temp_dir.path(), "broken.tbl", "NotATable\n")?;
    common::create_test_file(temp_dir.path(), "joined.properties", "k=one \\\n  two\n")?;

    let controller = Controller::with_config(Config::default())?;
    let report = controller.run_batch(temp_dir.path(), None, &Operation::RoundTrip)?;

    assert_eq!(report.succeeded.len(), 3);
    assert_eq!(report.mismatches.len(), 1);
    assert!(report.mismatches[0].0.ends_with("joined.properties"));
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].0.ends_with("broken.tbl"));
    assert_eq!(report.total(), 5);
    assert!(!report.is_success());
    assert!(report.summary().starts_with("5 document(s): 3 ok, 1 mismatched, 1 failed"));
    Ok(())
}

#[test]
fn test_run_batch_withPseudoRewrite_shouldWriteTargetFiles() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir_all(&input)?;
    populate(&input)?;

    let controller = Controller::with_config(Config::default())?;
    let operation = Operation::Rewrite {
        output_dir: Some(output.clone()),
        pseudo: true,
        force_overwrite: false,
    };
    let report = controller.run_batch(&input, None, &operation)?;
    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(report.succeeded.len(), 3);

    assert_eq!(
        fs::read_to_string(output.join("app.fr.properties"))?,
        "# UI\ngreeting=HELLO {0}\nbye=BYE\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("notes.fr.txt"))?,
        "FIRST LINE\r\nSECOND LINE\r\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("strings.fr.dtd"))?,
        "<!ENTITY title \"MAIN &amp; MORE\">\n"
    );

    // Existing outputs are kept unless forced
    let again = controller.run_batch(&input, None, &operation)?;
    assert_eq!(again.skipped.len(), 3);
    assert!(again.succeeded.is_empty());
    Ok(())
}

#[test]
fn test_rewrite_file_withLineBreakOverride_shouldNormalize() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.txt", "one\r\ntwo\r\n")?;
    let output = temp_dir.path().join("out").join("notes.txt");

    let config = Config {
        line_break: LineBreak::Lf,
        ..Config::default()
    };
    let controller = Controller::with_config(config)?;
    controller.rewrite_file(&input, "okf_plaintext", &output, false)?;

    assert_eq!(fs::read_to_string(&output)?, "one\ntwo\n");
    Ok(())
}

#[test]
fn test_collect_inputs_withRequestedFilter_shouldOverrideExtension() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "readme.unknown", "Plain words\n")?;
    let controller = Controller::with_config(Config::default())?;

    assert!(controller.collect_inputs(&file, None).is_err());
    let inputs = controller.collect_inputs(&file, Some("okf_plaintext"))?;
    assert_eq!(inputs, vec![(file.clone(), "okf_plaintext".to_string())]);
    assert!(controller.collect_inputs(&file, Some("okf_nothing")).is_err());
    Ok(())
}

#[test]
fn test_dump_events_withProperties_shouldWriteJsonLines() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.properties", "k=v\n")?;
    let controller = Controller::with_config(Config::default())?;

    let mut out = Vec::new();
    let count = controller.dump_events(&file, "okf_properties", &mut out)?;
    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(count, 3);
    assert_eq!(lines.len(), 3);
    let first: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(first["type"], "START_DOCUMENT");
    let second: serde_json::Value = serde_json::from_str(lines[1])?;
    assert_eq!(second["type"], "TEXT_UNIT");
    assert_eq!(second["resource"]["name"], "k");
    Ok(())
}

#[test]
fn test_with_config_withInvalidLocale_shouldFail() {
    common::init_logging();
    let config = Config {
        target_locale: "".to_string(),
        ..Config::default()
    };
    assert!(Controller::with_config(config).is_err());
}
