//! Integration tests for the chartcache command line
//!
//! Runs the binary against a temporary cache directory and a config path that
//! does not exist, so the user's own config and cache are never touched.
//! None of these commands reach the network.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(temp_dir: &Path, args: &[&str]) -> std::process::Output {
    let config = temp_dir.join("config.json");
    let cache_dir = temp_dir.join("tiles");
    Command::new(env!("CARGO_BIN_EXE_chartcache"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .output()
        .expect("Failed to execute chartcache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = Command::new(env!("CARGO_BIN_EXE_chartcache"))
        .arg("--help")
        .output()
        .expect("Failed to execute chartcache");
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("chartcache"), "Help should mention chartcache");
    assert!(stdout.contains("download"), "Help should list the download command");
    assert!(stdout.contains("lookup"), "Help should list the lookup command");
}

#[test]
fn test_regions_lists_louisiana() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["regions"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("louisiana-base"));
    assert!(stdout.contains("Louisiana coast"));
    assert!(stdout.contains("264 tiles"));
}

#[test]
fn test_regions_includes_configured_region() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.json"),
        r#"{ "regions": [{
            "id": "mobile-bay", "name": "Mobile Bay",
            "min_lat": 30.2, "max_lat": 30.8, "min_lon": -88.2, "max_lon": -87.7,
            "min_zoom": 8, "max_zoom": 8
        }] }"#,
    )
    .unwrap();

    let output = run_cli(temp_dir.path(), &["regions"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mobile-bay"));
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.json"), "{ broken").unwrap();

    let output = run_cli(temp_dir.path(), &["regions"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config"), "Should report the config error: {}", stderr);
}

#[test]
fn test_unknown_region_prints_error_and_exits() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["download", "atlantis", "--quiet"]);
    assert!(!output.status.success(), "Expected unknown region to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown region") && stderr.contains("atlantis"),
        "Should print error message about the unknown region: {}",
        stderr
    );
    assert!(!temp_dir.path().join("tiles").exists(), "Nothing should be written");
}

#[test]
fn test_lookup_missing_tile_exits_with_failure() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["lookup", "6", "15", "26"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("6/15/26 is not cached"));
}

#[test]
fn test_lookup_cached_tile_prints_path() {
    let temp_dir = TempDir::new().unwrap();
    let tile = temp_dir.path().join("tiles/6/15/26.png");
    fs::create_dir_all(tile.parent().unwrap()).unwrap();
    fs::write(&tile, b"png").unwrap();

    let output = run_cli(temp_dir.path(), &["lookup", "6", "15", "26"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), tile.display().to_string());
}

#[test]
fn test_clear_removes_cache_and_is_repeatable() {
    let temp_dir = TempDir::new().unwrap();
    let tile = temp_dir.path().join("tiles/6/15/26.png");
    fs::create_dir_all(tile.parent().unwrap()).unwrap();
    fs::write(&tile, b"png").unwrap();

    let output = run_cli(temp_dir.path(), &["clear"]);
    assert!(output.status.success());
    assert!(!temp_dir.path().join("tiles").exists());

    let output = run_cli(temp_dir.path(), &["clear"]);
    assert!(output.status.success(), "Clearing an empty cache should succeed");
}

#[test]
fn test_status_reports_tiles_and_coverage() {
    let temp_dir = TempDir::new().unwrap();
    for tile in ["tiles/6/15/26.png", "tiles/6/16/26.png"] {
        let path = temp_dir.path().join(tile);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"0123456789").unwrap();
    }

    let output = run_cli(temp_dir.path(), &["status", "louisiana-base"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cached tiles:    2"));
    assert!(stdout.contains("20 B"));
    assert!(stdout.contains("Louisiana coast: 2/264 tiles cached"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use chartcache::cli::{resolve_region, Cli, Command};
    use chartcache::config::Config;

    #[test]
    fn test_cli_download_without_region() {
        let cli = Cli::parse_from(["chartcache", "download"]);
        assert!(matches!(cli.command, Command::Download { region: None, .. }));
    }

    #[test]
    fn test_cli_status_with_region() {
        let cli = Cli::parse_from(["chartcache", "status", "louisiana-base"]);
        assert_eq!(
            cli.command,
            Command::Status {
                region: Some("louisiana-base".to_string())
            }
        );
    }

    #[test]
    fn test_resolve_builtin_region() {
        let region = resolve_region(&Config::default(), Some("louisiana-base")).unwrap();
        assert_eq!(region.max_zoom, 10);
    }
}
