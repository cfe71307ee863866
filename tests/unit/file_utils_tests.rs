/*!
 * Tests for file and directory utilities
 */

use anyhow::Result;
use filterkit::file_utils::FileManager;
use filterkit::filters::FilterConfigurationMapper;
use std::fs;
use std::path::PathBuf;

use crate::common;

#[test]
fn test_find_files_withMixedExtensions_shouldFilterAndSort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("nested"))?;
    common::create_test_file(root, "b.txt", "b")?;
    common::create_test_file(root, "a.TXT", "a")?;
    common::create_test_file(root, "c.md", "c")?;
    common::create_test_file(&root.join("nested"), "d.txt", "d")?;

    let files = FileManager::find_files(root, &[".txt"])?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.strip_prefix(root).ok())
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();

    assert_eq!(names, vec!["a.TXT", "b.txt", "nested/d.txt"]);
    Ok(())
}

#[test]
fn test_find_documents_withRegistry_shouldPairConfigIds() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "app.properties", "k=v\n")?;
    common::create_test_file(root, "strings.dtd", "<!ENTITY a \"A\">\n")?;
    common::create_test_file(root, "image.png", "not text")?;

    let mapper = FilterConfigurationMapper::with_defaults();
    let documents = FileManager::find_documents(root, &mapper)?;

    let found: Vec<(String, String)> = documents
        .into_iter()
        .filter_map(|(path, id)| Some((path.file_name()?.to_string_lossy().to_string(), id)))
        .collect();
    assert_eq!(
        found,
        vec![
            ("app.properties".to_string(), "okf_properties".to_string()),
            ("strings.dtd".to_string(), "okf_dtd".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_generate_output_path_withoutExtension_shouldAppendLocale() {
    let path = FileManager::generate_output_path("in/README", "out", "de-CH");
    assert_eq!(path, PathBuf::from("out/README.de-CH"));
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));
    assert!(!FileManager::file_exists(&nested));
    Ok(())
}
