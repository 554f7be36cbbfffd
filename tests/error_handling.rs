// tests/error_handling.rs

mod common;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use common::builders::{ConfigFileBuilder, ProjectLayout};
use tempfile::{NamedTempFile, TempDir};
use watchserve::cli::CliArgs;
use watchserve::config::{load_and_validate, ConfigFile, ServeSettings};
use watchserve::errors::WatchserveError;
use watchserve::types::HashStorageMode;

fn args_for(root: &Path) -> CliArgs {
    CliArgs {
        target_path: Some(root.to_path_buf()),
        ..CliArgs::default()
    }
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[serve\ninterval = 3").unwrap();

    match load_and_validate(file.path()) {
        Err(WatchserveError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_stop_timeout_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[serve]
stop_timeout = 0
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(WatchserveError::ConfigError(msg)) => assert!(msg.contains("stop_timeout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_watch_dir_entry_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[watch]
dirs = ["app", " / "]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(WatchserveError::ConfigError(msg)) => assert!(msg.contains("empty")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_invalid_exclude_regex_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[watch]
exclude_names = ["(unclosed"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(WatchserveError::ConfigError(msg)) => assert!(msg.contains("patterns")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_out_of_range_interval_falls_back_to_default() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[serve]
interval = 99
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.serve.interval, 3);
}

#[test]
fn test_full_config_file_is_read() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[serve]
interpreter = "/usr/local/bin/php"
entry = "bin/app"
command = "ws:start -d"
interval = 0
restart_delay = 5
stop_timeout = 10
debug = true

[watch]
dirs = ["src"]
include = ["*.php", "*.env"]
exclude_dirs = ["vendor"]
fast_mode = false
hash_storage = "memory"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.serve.interpreter, "/usr/local/bin/php");
    assert_eq!(cfg.serve.entry, "bin/app");
    assert_eq!(cfg.serve.command, "ws:start -d");
    assert_eq!(cfg.serve.interval, 0);
    assert_eq!(cfg.serve.restart_delay, 5);
    assert_eq!(cfg.serve.stop_timeout, 10);
    assert!(cfg.serve.debug);
    assert_eq!(cfg.watch.dirs, vec!["src".to_string()]);
    assert_eq!(cfg.watch.include.len(), 2);
    assert_eq!(cfg.watch.exclude_dirs, vec!["vendor".to_string()]);
    assert!(!cfg.watch.fast_mode);
    assert_eq!(cfg.watch.hash_storage, HashStorageMode::Memory);
}

#[test]
fn test_missing_entry_file_returns_entry_file_missing() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("app")).unwrap();
    std::fs::create_dir(tmp.path().join("config")).unwrap();

    match ServeSettings::resolve(&ConfigFile::default(), &args_for(tmp.path()), tmp.path()) {
        Err(WatchserveError::EntryFileMissing(path)) => {
            assert_eq!(path, tmp.path().join("bin/swoft"));
        }
        Err(e) => panic!("Expected EntryFileMissing, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_watch_dir_returns_config_error() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(tmp.path());

    let args = CliArgs {
        watch: Some("app, resources".to_string()),
        ..args_for(project.root())
    };

    match ServeSettings::resolve(&ConfigFile::default(), &args, tmp.path()) {
        Err(WatchserveError::ConfigError(msg)) => assert!(msg.contains("resources")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_stop_timeout_flag_returns_config_error() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(tmp.path());

    let args = CliArgs {
        stop_timeout: Some(0),
        ..args_for(project.root())
    };

    assert!(matches!(
        ServeSettings::resolve(&ConfigFile::default(), &args, tmp.path()),
        Err(WatchserveError::ConfigError(_))
    ));
}

#[test]
fn test_settings_defaults() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(tmp.path());

    let settings =
        ServeSettings::resolve(&ConfigFile::default(), &args_for(project.root()), tmp.path())
            .unwrap();

    assert_eq!(settings.entry_file, project.path("bin/swoft"));
    assert_eq!(settings.command, "http:start");
    assert_eq!(
        settings.watch_dirs,
        vec![project.path("app"), project.path("config")]
    );
    assert!(settings.fast_mode);
    assert_eq!(settings.hash_storage, HashStorageMode::File);
    assert_eq!(settings.options.interval, Duration::from_secs(3));
    assert_eq!(settings.options.restart_delay, Duration::from_secs(3));
    assert_eq!(settings.options.stop.timeout, Duration::from_secs(45));

    let spec = settings.launch_spec();
    assert_eq!(
        spec.args,
        vec![
            project.path("bin/swoft").to_string_lossy().into_owned(),
            "http:start".to_string()
        ]
    );
    assert_eq!(spec.cwd.as_deref(), Some(project.root()));

    let name = settings.marker_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("server-") && name.ends_with(".id"), "{name}");
}

#[test]
fn test_cli_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(tmp.path());
    project.write("bin/other", "<?php");
    std::fs::create_dir(project.path("src")).unwrap();

    let cfg = ConfigFileBuilder::new()
        .entry("bin/swoft")
        .command("http:start")
        .interval(5)
        .stop_timeout(20)
        .runtime_dir(tmp.path())
        .build();

    let args = CliArgs {
        bin_file: Some("bin/other".to_string()),
        start_cmd: Some("ws:start".to_string()),
        watch: Some("/src/, config".to_string()),
        interval: Some(40),
        stop_timeout: Some(7),
        full_scan: true,
        hash_storage: Some(HashStorageMode::Memory),
        debug: true,
        ..args_for(project.root())
    };

    let settings = ServeSettings::resolve(&cfg, &args, tmp.path()).unwrap();

    assert_eq!(settings.entry_file, project.path("bin/other"));
    assert_eq!(settings.command, "ws:start");
    assert_eq!(
        settings.watch_dirs,
        vec![project.path("src"), project.path("config")]
    );
    // Out of range on the CLI too: back to the default.
    assert_eq!(settings.options.interval, Duration::from_secs(3));
    assert_eq!(settings.options.stop.timeout, Duration::from_secs(7));
    assert!(!settings.fast_mode);
    assert!(settings.options.debug);
    assert_eq!(settings.hash_storage, HashStorageMode::Memory);
    assert!(settings.marker_path.starts_with(tmp.path()));
}

#[test]
fn test_relative_target_path_with_parent_components() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(&tmp.path().join("project"));
    std::fs::create_dir(tmp.path().join("elsewhere")).unwrap();

    let args = CliArgs {
        target_path: Some("../project".into()),
        ..CliArgs::default()
    };
    let cwd = tmp.path().join("elsewhere");

    let settings = ServeSettings::resolve(&ConfigFile::default(), &args, &cwd).unwrap();
    assert_eq!(
        settings.target_dir,
        project.root().canonicalize().unwrap()
    );
}

#[test]
fn test_detector_from_settings_uses_file_marker() {
    let tmp = TempDir::new().unwrap();
    let project = ProjectLayout::standard(tmp.path());
    project.write("app/Http/Controller.php", "<?php");

    let cfg = ConfigFileBuilder::new().runtime_dir(tmp.path()).build();
    let settings =
        ServeSettings::resolve(&cfg, &args_for(project.root()), tmp.path()).unwrap();

    let mut detector = settings
        .build_detector(std::sync::Arc::new(watchserve::fs::RealFileSystem))
        .unwrap();
    detector.initialize_baseline().unwrap();

    assert_eq!(detector.marker_location(), Some(settings.marker_path.as_path()));
    let stored = std::fs::read_to_string(&settings.marker_path).unwrap();
    assert_eq!(Some(stored.trim()), detector.dir_hash());
}
