use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;

use crate::{CliTest, HOME_SCREEN, stderr};

#[test]
fn test_apply_rewrites_screen_and_catalogs() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.apply_command());

    let home = test.read_file("lib/screens/home.dart")?;
    assert_eq!(
        home,
        "import 'package:flutter/material.dart';
import '../l10n/app_localizations.dart';

class HomePage extends StatelessWidget {
  static const title = 'Home Screen'; // TODO(l10n): home_title

  @override
  Widget build(BuildContext context) {
    return Column(children: [
      Text(AppLocalizations.of(context)?.save_button ?? 'Save'),
      Text(AppLocalizations.of(context)?.cancel_button ?? 'Cancel'),
    ]);
  }
}
"
    );

    let en = test.read_json("lib/l10n/app_en.arb")?;
    let ru = test.read_json("lib/l10n/app_ru.arb")?;
    assert_eq!(en["save_button"], "Save");
    assert_eq!(en["cancel_button"], "Cancel");
    assert_eq!(ru["save_button"], "[RU] Save");
    assert_eq!(ru["cancel_button"], "[RU] Cancel");
    assert!(en.get("@save_button").is_some());
    assert!(en.get("home_title").is_none());
    assert!(en.get("maybe_later").is_none());

    assert!(
        test.root()
            .join("backup_before_localization/lib/screens/home.dart")
            .is_file()
    );
    Ok(())
}

#[test]
fn test_apply_twice_changes_nothing() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let _settings = test.snapshot_settings().bind_to_scope();

    test.apply_command().output()?;
    let home = test.read_file("lib/screens/home.dart")?;
    let en = test.read_file("lib/l10n/app_en.arb")?;

    assert_cmd_snapshot!(test.apply_command());

    assert_eq!(test.read_file("lib/screens/home.dart")?, home);
    assert_eq!(test.read_file("lib/l10n/app_en.arb")?, en);
    Ok(())
}

#[test]
fn test_apply_dry_run_writes_nothing() -> Result<()> {
    let test = CliTest::flutter_project()?;

    assert_cmd_snapshot!(test.apply_command().arg("--dry-run"));

    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    assert_eq!(
        test.read_file("lib/l10n/app_ru.arb")?,
        "{\n  \"@@locale\": \"ru\"\n}\n"
    );
    assert!(!test.root().join("backup_before_localization").exists());
    Ok(())
}

#[test]
fn test_apply_verbose_lists_exclusions() -> Result<()> {
    let test = CliTest::flutter_project()?;

    // Keep debug events out of stderr
    assert_cmd_snapshot!(
        test.apply_command()
            .args(["--dry-run", "-v"])
            .env("ARBIFY_LOG", "off")
    );
    Ok(())
}

#[test]
fn test_apply_confidence_flag_overrides_threshold() -> Result<()> {
    let test = CliTest::flutter_project()?;
    test.write_file(
        "lib/screens/later.dart",
        "Widget later(BuildContext context) => Text('Maybe later');\n",
    )?;
    test.write_file(
        "strings_to_localize.json",
        r#"{"maybe_later": {"value": "Maybe later", "confidence": 0.5, "description": "Found in lib/screens/later.dart"}}"#,
    )?;

    let output = test.apply_command().args(["--confidence", "0.4"]).output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        test.read_file("lib/screens/later.dart")?,
        "import '../l10n/app_localizations.dart';\n\nWidget later(BuildContext context) => Text(AppLocalizations.of(context)?.maybe_later ?? 'Maybe later');\n"
    );
    Ok(())
}

#[test]
fn test_apply_helper_without_context_is_deferred() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let helper = "class Validator {
  String? check(String v) {
    return 'Required field';
  }
}
";
    test.write_file("lib/validator.dart", helper)?;
    test.write_file(
        "strings_to_localize.json",
        r#"{"required_field": {"value": "Required field", "confidence": 0.9, "description": "Found in lib/validator.dart"}}"#,
    )?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.apply_command());

    assert_eq!(
        test.read_file("lib/validator.dart")?,
        "class Validator {
  String? check(String v) {
    return 'Required field'; // TODO(l10n): required_field
  }
}
"
    );
    Ok(())
}

#[test]
fn test_apply_malformed_catalog_aborts_before_changes() -> Result<()> {
    let test = CliTest::flutter_project()?;
    test.write_file("lib/l10n/app_ru.arb", r#"["not", "an", "object"]"#)?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.apply_command());

    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    assert!(!test.root().join("backup_before_localization").exists());
    Ok(())
}

#[test]
fn test_apply_missing_suggestions_is_an_error() -> Result<()> {
    let test = CliTest::flutter_project()?;

    let output = test
        .apply_command()
        .args(["--suggestions", "nowhere.json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    // The reason is the platform's I/O error text
    assert!(
        stderr(&output).starts_with("Error: failed to read suggestions nowhere.json: "),
        "{}",
        stderr(&output)
    );
    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    Ok(())
}

#[test]
fn test_apply_invalid_confidence_is_rejected() -> Result<()> {
    let test = CliTest::flutter_project()?;

    assert_cmd_snapshot!(test.apply_command().args(["--confidence", "1.5"]));
    Ok(())
}
