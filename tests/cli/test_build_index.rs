//! Tests for the build-index CLI command

use crate::common::{write_file, REVISED_DOC};
use docsearch::cli::commands::build_index::{execute, BuildIndexArgs};
use docsearch::cli::OutputFormat;
use docsearch::core::indexer::INDEX_SCHEMA_VERSION;
use docsearch::core::storage::{read_version, DataLayout};
use tempfile::TempDir;

/// Test a bundle is written with corpus, index and marker
#[test]
fn test_build_index_writes_bundle() {
    let temp = TempDir::new().unwrap();
    let docs_file = temp.path().join("input/llms-full.txt");
    write_file(&docs_file, REVISED_DOC);
    let output_dir = temp.path().join("bundle");

    let args = BuildIndexArgs {
        docs_file,
        output_dir: output_dir.clone(),
    };
    let result = execute(args, OutputFormat::Human);
    assert!(result.is_ok(), "Build should succeed: {:?}", result.err());

    let layout = DataLayout::new(&output_dir);
    assert!(layout.index_dir().join("meta.json").is_file());
    assert!(!layout.staging_dir().exists());
    assert_eq!(read_version(&layout.version_file()), Some(INDEX_SCHEMA_VERSION));
    assert_eq!(
        std::fs::read_to_string(layout.source_file()).unwrap(),
        REVISED_DOC
    );
}

/// Test JSON output
#[test]
fn test_build_index_json() {
    let temp = TempDir::new().unwrap();
    let docs_file = temp.path().join("llms-full.txt");
    write_file(&docs_file, REVISED_DOC);

    let args = BuildIndexArgs {
        docs_file,
        output_dir: temp.path().join("out"),
    };
    assert!(execute(args, OutputFormat::Json).is_ok());
}

/// Test a missing input file is reported
#[test]
fn test_build_index_missing_file() {
    let temp = TempDir::new().unwrap();
    let args = BuildIndexArgs {
        docs_file: temp.path().join("missing.txt"),
        output_dir: temp.path().join("out"),
    };

    let err = execute(args, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert!(!temp.path().join("out").exists());
}
