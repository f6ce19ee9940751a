use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Ok, Result};
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

mod apply;
mod init;
mod match_catalog;
mod restore;
mod scan;

const BIN_NAME: &str = "arbify";

/// A Flutter screen with one plain, one const and one static literal.
pub const HOME_SCREEN: &str = "import 'package:flutter/material.dart';

class HomePage extends StatelessWidget {
  static const title = 'Home Screen';

  @override
  Widget build(BuildContext context) {
    return Column(children: [
      Text('Save'),
      const Text('Cancel'),
    ]);
  }
}
";

pub const SUGGESTIONS: &str = r#"{
  "save_button": {"value": "Save", "confidence": 0.95, "description": "Found in lib/screens/home.dart", "widget_type": "button"},
  "cancel_button": {"value": "Cancel", "confidence": 0.9, "description": "Found in lib/screens/home.dart", "widget_type": "button"},
  "home_title": {"value": "Home Screen", "confidence": 0.9, "description": "Found in lib/screens/home.dart"},
  "maybe_later": {"value": "Maybe later", "confidence": 0.5, "description": "Found in lib/screens/home.dart"}
}"#;

pub struct CliTest {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl CliTest {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().canonicalize()?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// A project with one screen, English and Russian catalogs and a
    /// suggestion document at the default location.
    pub fn flutter_project() -> Result<Self> {
        let test = Self::new()?;
        test.write_file("lib/screens/home.dart", HOME_SCREEN)?;
        test.write_file("lib/main.dart", "void main() => runApp(const App());\n")?;
        test.write_file("lib/l10n/app_en.arb", "{\n  \"@@locale\": \"en\"\n}\n")?;
        test.write_file("lib/l10n/app_ru.arb", "{\n  \"@@locale\": \"ru\"\n}\n")?;
        test.write_file("strings_to_localize.json", SUGGESTIONS)?;
        Ok(test)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.project_dir.join(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory:{}", parent.display()))?;
        }

        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write file: {}", file_path.display()))?;

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.project_dir
    }

    /// Snapshot settings replacing the temp project path with `[PROJECT]`.
    pub fn snapshot_settings(&self) -> insta::Settings {
        let mut settings = insta::Settings::clone_current();
        settings.add_filter(
            &regex::escape(&self.project_dir.display().to_string()),
            "[PROJECT]",
        );
        settings
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(get_cargo_bin(BIN_NAME));
        cmd.current_dir(&self.project_dir);
        cmd.env_clear();
        cmd.env("NO_COLOR", "1"); // Disable colors for consistent test output
        cmd
    }

    pub fn apply_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("apply");
        cmd
    }

    pub fn match_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("match");
        cmd
    }

    pub fn scan_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("scan");
        cmd
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.project_dir.join(path);
        fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))
    }

    pub fn read_json(&self, path: &str) -> Result<serde_json::Value> {
        let content = self.read_file(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path))
    }
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
