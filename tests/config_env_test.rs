use autoreloader::{ReloadMode, Settings, WatcherKind};
use std::env;
use std::fs;
use tempfile::TempDir;

// One test per process-wide env mutation; cargo runs tests in threads.
#[test]
fn test_env_overrides_file_and_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    fs::write(
        &config_path,
        "[autoload]\npaths = [\"app\"]\nreload_only_on_change = true\ndebounce_ms = 100\n",
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("AR_AUTOLOAD__RELOAD_ONLY_ON_CHANGE", "false");
        env::set_var("AR_AUTOLOAD__WATCHER", "notify");
        env::set_var("AR_LOGGING__DEFAULT", "debug");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("AR_AUTOLOAD__RELOAD_ONLY_ON_CHANGE");
        env::remove_var("AR_AUTOLOAD__WATCHER");
        env::remove_var("AR_LOGGING__DEFAULT");
    }

    assert_eq!(settings.autoload.paths, vec![std::path::PathBuf::from("app")]);
    assert_eq!(settings.autoload.debounce_ms, 100);
    assert_eq!(settings.autoload.reload_mode(), ReloadMode::Eager);
    assert_eq!(settings.autoload.watcher, WatcherKind::Notify);
    assert_eq!(settings.logging.default, "debug");
    assert_eq!(settings.autoload.extension, "rb");
}
