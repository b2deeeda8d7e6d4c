//! Viewer configuration files feeding a live viewer.

mod common;

use code_diff_config::{CONFIG_PATH_ENV, ConfigError, DiffStyle, ViewerConfig};
use code_diff_view::{DiffViewer, Language, OptionsMap};
use common::write_temp;

#[tokio::test]
async fn test_yaml_defaults_apply_under_call_options() {
    let (_dir, path) = write_temp(
        "config.yaml",
        "bridge:\n  response_timeout_ms: 1500\ndefault_language: rust\ndefaults:\n  diffStyle: char\n  context: 2\n",
    );
    let config = ViewerConfig::load_from(&path).unwrap();
    assert_eq!(config.bridge.response_timeout_ms, 1500);
    assert_eq!(config.bridge.mount_timeout_ms, 5000);

    let viewer = DiffViewer::local(&config).unwrap();
    let result = viewer
        .render("a\n", "b\n", &OptionsMap::new(), None)
        .await
        .unwrap();
    assert_eq!(result.applied_options.diff_style, DiffStyle::Char);
    assert_eq!(result.applied_options.context, 2);

    let request = viewer.request("a", "b", &OptionsMap::new(), None).unwrap();
    assert_eq!(request.language, Language::Rust);
}

#[test]
fn test_invalid_defaults_rejected_at_load() {
    let (_dir, path) = write_temp("config.yaml", "defaults:\n  outputFormat: grid\n");
    assert!(matches!(
        ViewerConfig::load_from(&path),
        Err(ConfigError::InvalidOption { .. })
    ));
}

#[test]
fn test_config_path_env_override() {
    // Only this test touches the variable in this binary.
    let (_dir, path) = write_temp("custom.yaml", "");
    unsafe { std::env::set_var(CONFIG_PATH_ENV, &path) };
    assert_eq!(ViewerConfig::config_path(), path);
    assert_eq!(ViewerConfig::load().unwrap(), ViewerConfig::default());
    unsafe { std::env::remove_var(CONFIG_PATH_ENV) };
}
