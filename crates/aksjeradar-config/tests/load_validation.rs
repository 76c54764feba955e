// crates/aksjeradar-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict.
// Dependencies: aksjeradar-config, tempfile
// ============================================================================

//! Config load validation tests for aksjeradar-config.

use std::io::Write;
use std::path::Path;

use aksjeradar_config::AksjeradarConfig;
use aksjeradar_config::ConfigError;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<AksjeradarConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(AksjeradarConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(AksjeradarConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let path = Path::new("definitely-missing-aksjeradar.toml");
    assert_invalid(AksjeradarConfig::load(Some(path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(AksjeradarConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(AksjeradarConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[access\nexempt_emails = 3").map_err(|err| err.to_string())?;
    assert_invalid(AksjeradarConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_reads_valid_file_and_records_mtime() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(
        b"[access]\nexempt_emails = [\"staff@aksjeradar.trade\"]\n\n[server]\nbind = \
          \"127.0.0.1:9000\"\n",
    )
    .map_err(|err| err.to_string())?;
    let config = AksjeradarConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.source_modified_at.is_none() {
        return Err("expected source_modified_at".to_string());
    }
    if config.server.bind != "127.0.0.1:9000" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if !config.exemption_policy().is_exempt_email("staff@aksjeradar.trade") {
        return Err("expected staff email to be exempt".to_string());
    }
    Ok(())
}
