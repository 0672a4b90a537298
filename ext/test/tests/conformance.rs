//! Compile conformance tests: every YAML fixture under `fixtures/compile`.
//!
//! Run with: cargo test -p routegen-test --test conformance
//! Set `RUST_LOG=routegen=debug` to see diagnostics and compile summaries.

use routegen_test::CompileFixture;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the fixtures directory relative to the workspace root.
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent() // ext
        .and_then(|p| p.parent()) // workspace root
        .expect("Could not find workspace root")
        .join("fixtures")
        .join("compile")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn compile_fixtures() {
    init_tracing();

    let dir = fixtures_dir();
    assert!(
        dir.exists(),
        "Compile fixtures directory does not exist: {}",
        dir.display()
    );

    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| {
            path.extension()
                .is_some_and(|e| e == "yaml" || e == "yml")
        })
        .collect();
    paths.sort();

    let mut ran = 0;
    let mut failures = Vec::new();
    for path in &paths {
        println!("Loading compile fixture: {}", path.display());
        let yaml = fs::read_to_string(path).expect("read yaml");
        let fixtures = CompileFixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            ran += 1;
            if let Err(reason) = fixture.check() {
                failures.push(format!("{} ({}): {reason}", fixture.name, path.display()));
            }
        }
    }

    assert!(ran > 0, "no compile fixtures found in {}", dir.display());
    assert!(
        failures.is_empty(),
        "{} of {ran} fixtures failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}
