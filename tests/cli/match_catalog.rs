use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;

use crate::CliTest;

const EN_CATALOG: &str = r#"{
  "@@locale": "en",
  "save_button": "Save",
  "@save_button": {
    "description": "Primary save action"
  },
  "home_title": "Home Screen"
}
"#;

const RU_CATALOG: &str = r#"{
  "@@locale": "ru",
  "save_button": "Сохранить",
  "home_title": "Главная"
}
"#;

#[test]
fn test_match_reuses_existing_keys() -> Result<()> {
    let test = CliTest::flutter_project()?;
    test.write_file("lib/l10n/app_en.arb", EN_CATALOG)?;
    test.write_file("lib/l10n/app_ru.arb", RU_CATALOG)?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.match_command());

    let home = test.read_file("lib/screens/home.dart")?;
    assert!(home.contains("Text(AppLocalizations.of(context)?.save_button ?? 'Save')"));
    // Not in any catalog
    assert!(home.contains("const Text('Cancel')"));
    assert!(home.contains("static const title = 'Home Screen'; // TODO(l10n): home_title"));

    // Existing translations are kept as they are
    assert_eq!(test.read_file("lib/l10n/app_ru.arb")?, RU_CATALOG);
    let en = test.read_json("lib/l10n/app_en.arb")?;
    assert_eq!(en["@save_button"]["description"], "Primary save action");
    Ok(())
}

#[test]
fn test_match_with_empty_catalog_changes_nothing() -> Result<()> {
    let test = CliTest::flutter_project()?;
    let before = test.read_file("lib/screens/home.dart")?;
    let _settings = test.snapshot_settings().bind_to_scope();

    assert_cmd_snapshot!(test.match_command());

    assert_eq!(test.read_file("lib/screens/home.dart")?, before);
    Ok(())
}

#[test]
fn test_match_max_files_limits_units() -> Result<()> {
    let test = CliTest::flutter_project()?;
    test.write_file("lib/l10n/app_en.arb", EN_CATALOG)?;
    test.write_file("lib/a.dart", "Widget a(BuildContext context) => Text('Save');\n")?;

    let _settings = test.snapshot_settings().bind_to_scope();

    // Units are processed in sorted order, so only lib/a.dart is visited.
    assert_cmd_snapshot!(test.match_command().args(["--max-files", "1"]));

    assert!(
        test.read_file("lib/a.dart")?
            .contains("AppLocalizations.of(context)?.save_button ?? 'Save'")
    );
    assert!(test.read_file("lib/screens/home.dart")?.contains("Text('Save')"));
    Ok(())
}
