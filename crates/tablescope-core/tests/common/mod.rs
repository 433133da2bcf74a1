use std::fs;
use std::path::PathBuf;

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn fixture_path(group: &str, name: &str) -> PathBuf {
    fixtures_root().join(group).join(name)
}

pub fn load_fixture(group: &str, name: &str) -> String {
    let path = fixture_path(group, name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {path:?}: {e}"))
}
