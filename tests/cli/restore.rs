use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;

use crate::{CliTest, HOME_SCREEN, stderr};

#[test]
fn test_restore_undoes_apply() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let en_before = test.read_file("lib/l10n/app_en.arb")?;
    let _settings = test.snapshot_settings().bind_to_scope();

    let output = test.apply_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_ne!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);

    assert_cmd_snapshot!(test.apply_command().arg("--restore"));

    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    assert_eq!(test.read_file("lib/l10n/app_en.arb")?, en_before);
    Ok(())
}

#[test]
fn test_restore_without_backup_fails() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.match_command().arg("--restore"));

    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    Ok(())
}

#[test]
fn test_restore_conflicts_with_dry_run() -> Result<()> {
    let test = CliTest::flutter_project()?;

    // clap usage text is not ours to pin
    let output = test
        .apply_command()
        .args(["--restore", "--dry-run"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
