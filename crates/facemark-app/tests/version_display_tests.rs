//! Integration tests for version embedding.

use facemark_app::app_version;

#[test]
fn version_display_tests_embeds_semver_from_version_file() {
    let version = app_version();
    assert!(!version.trim().is_empty());

    let parts: Vec<&str> = version.split('.').collect();
    assert_eq!(parts.len(), 3, "version should be MAJOR.MINOR.PATCH");
    for part in parts {
        part.parse::<u64>().expect("version parts should be numeric");
    }
}
