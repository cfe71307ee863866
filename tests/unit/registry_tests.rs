/*!
 * Tests for the filter configuration registry
 */

use anyhow::Result;
use filterkit::errors::FilterError;
use filterkit::Filter;
use filterkit::filters::{FilterConfigurationMapper, PropertiesFilter};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::common;

#[test]
fn test_with_defaults_shouldOfferEveryConfiguration() {
    let mapper = FilterConfigurationMapper::with_defaults();
    for id in [
        "okf_properties",
        "okf_properties-html-subfilter",
        "okf_plaintext",
        "okf_plaintext_trim_trail",
        "okf_plaintext_trim_all",
        "okf_dtd",
        "okf_transtable",
        "okf_html",
    ] {
        assert!(mapper.contains(id), "missing configuration {}", id);
    }
}

#[test]
fn test_config_for_path_withKnownExtensions_shouldResolve() {
    let mapper = FilterConfigurationMapper::with_defaults();
    assert_eq!(mapper.config_for_path(Path::new("notes.txt")), Some("okf_plaintext"));
    assert_eq!(mapper.config_for_path(Path::new("table.tbl")), Some("okf_transtable"));
    assert_eq!(mapper.config_for_path(Path::new("page.HTM")), Some("okf_html"));
    assert_eq!(mapper.config_for_path(Path::new("no_extension")), None);
}

#[test]
fn test_map_extension_withKnownConfig_shouldOverrideMapping() -> Result<()> {
    let mut mapper = FilterConfigurationMapper::with_defaults();
    mapper.map_extension(".msg", "okf_properties")?;
    mapper.map_extension("txt", "okf_plaintext_trim_all")?;

    assert_eq!(mapper.config_for_path(Path::new("a.msg")), Some("okf_properties"));
    assert_eq!(mapper.config_for_path(Path::new("a.txt")), Some("okf_plaintext_trim_all"));
    Ok(())
}

#[test]
fn test_map_extension_withUnknownConfig_shouldFail() {
    let mut mapper = FilterConfigurationMapper::with_defaults();
    assert!(matches!(
        mapper.map_extension(".msg", "okf_nothing"),
        Err(FilterError::UnknownConfiguration(_))
    ));
}

#[test]
fn test_apply_overrides_withIdLikeResname_shouldUseKeysAsIds() -> Result<()> {
    let mut mapper = FilterConfigurationMapper::with_defaults();
    mapper.apply_overrides("okf_properties", &json!({ "id_like_resname": true }))?;
    let mapper = Arc::new(mapper);

    let mut filter = mapper.create_filter("okf_properties")?;
    assert!(filter.parameters().id_like_resname);

    let document = filterkit::RawDocument::from_text("title=Title\nbody=Body\n", common::en());
    let events = filterkit::filters::extract_all(filter.as_mut(), document)?;
    let ids: Vec<&str> = common::text_units(&events).into_iter().map(|tu| tu.id.as_str()).collect();
    assert_eq!(ids, vec!["title", "body"]);
    Ok(())
}

#[test]
fn test_apply_overrides_withWrongType_shouldFail() {
    let mut mapper = FilterConfigurationMapper::with_defaults();
    let result = mapper.apply_overrides("okf_properties", &json!({ "use_code_finder": "yes" }));
    assert!(result.is_err());
}

#[test]
fn test_register_withCustomMapper_shouldOnlyCreateRegisteredFilters() -> Result<()> {
    let mut mapper = FilterConfigurationMapper::new();
    mapper.register(PropertiesFilter::create);
    let mapper = Arc::new(mapper);

    assert!(mapper.create_filter("okf_properties").is_ok());
    assert!(matches!(
        mapper.create_filter("okf_dtd"),
        Err(FilterError::UnknownConfiguration(_))
    ));
    Ok(())
}
