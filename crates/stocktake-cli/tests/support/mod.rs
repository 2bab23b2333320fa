use assert_cmd::Command;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("stocktake");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("RUST_LOG");
    (command, temp_home)
}

pub fn config_dir(home: &Path) -> PathBuf {
    home.join(".config").join("stocktake")
}

/// A base URL with nothing listening behind it.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    base_url
}

pub fn write_valid_config(home: &Path, base_url: &str) {
    let config_dir = config_dir(home);
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
version = 1

[server]
base_url = "{base_url}"

[store]
id = 3
title = "Main Store"
"#
        ),
    )
    .expect("write config");
}

pub fn write_cache(home: &Path) {
    let cache_dir = config_dir(home).join("cache");
    fs::create_dir_all(&cache_dir).expect("create cache dir");
    fs::write(
        cache_dir.join("store-3.toml"),
        r#"
version = 1
store_id = 3
fetched_at = "2026-10-19T09:00:00Z"
current_list_index = 0
current_item_index = 0

[[lists]]
id = 10
name = "Start"
type = "Count"
count = 1

[[items]]
id = 1
name = "Milk"

[[items.list_items]]
list_id = 10
amount = 4.0

[[items]]
id = 2
name = "Bread"
"#,
    )
    .expect("write cache");
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
