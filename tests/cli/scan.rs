use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;

use crate::{CliTest, HOME_SCREEN};

#[test]
fn test_scan_lists_candidates_without_writing() -> Result<()> {
    let test = CliTest::flutter_project()?;

    // Import URIs are never candidates; lib/main.dart has none but is counted
    assert_cmd_snapshot!(test.scan_command());

    assert_eq!(test.read_file("lib/screens/home.dart")?, HOME_SCREEN);
    assert!(!test.root().join("backup_before_localization").exists());
    Ok(())
}

#[test]
fn test_scan_skips_non_ui_text() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(
        "lib/links.dart",
        "const home = 'https://example.com';\nconst code = 'API_KEY';\nconst label = 'Open settings';\n",
    )?;

    assert_cmd_snapshot!(test.scan_command());
    Ok(())
}

#[test]
fn test_scan_honours_project_root() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(
        "app/lib/main.dart",
        "Widget a(BuildContext context) => Text('Hello there');\n",
    )?;

    assert_cmd_snapshot!(test.scan_command().args(["--root", "app"]));
    Ok(())
}
