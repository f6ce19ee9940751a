use anyhow::{Context, Result};
use insta_cmd::assert_cmd_snapshot;
use serde_json::Value;

use crate::CliTest;

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    assert_cmd_snapshot!(test.command().arg("init"));

    let content = test.read_file(".arbifyrc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["sourceRoot"], "lib");
    assert_eq!(parsed["referenceLocale"], "en");
    assert!(parsed.get("catalogPattern").is_some());
    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".arbifyrc.json", "{}")?;

    assert_cmd_snapshot!(test.command().arg("init"));

    assert_eq!(test.read_file(".arbifyrc.json")?, "{}");
    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::flutter_project()?;

    test.command().arg("init").output()?;

    let output = test.apply_command().arg("--dry-run").output()?;
    assert!(
        output.status.success(),
        "Apply should work with initialized config. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}
