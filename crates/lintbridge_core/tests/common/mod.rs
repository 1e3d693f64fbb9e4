#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lintbridge_core::{EngineSettings, Linter, Settings};
use tempfile::TempDir;

/// A `/bin/sh` script standing in for the engine executable.
pub struct FakeEngine {
    dir: TempDir,
    path: PathBuf,
}

impl FakeEngine {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the script can use for marker files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings(&self) -> EngineSettings {
        let mut settings = EngineSettings::default();
        settings.executable = self.path.clone();
        settings
    }

    pub fn linter(&self) -> Linter {
        Linter::new(Arc::new(Settings::new(self.settings())))
    }
}

/// A report with one `no-var` message carrying a fix.
pub fn no_var_report(path: &str) -> String {
    format!(
        r#"[{{"filePath":"{path}","messages":[{{"ruleId":"no-var","severity":2,"message":"Unexpected var, use let or const instead.","line":1,"column":1,"endLine":1,"endColumn":11,"fix":{{"range":[0,3],"text":"let"}}}}],"errorCount":1,"warningCount":0,"fixableErrorCount":1,"fixableWarningCount":0}}]"#
    )
}

/// An engine that answers `--print-config` with `config` and lints with
/// `report`, exiting 1.
pub fn engine_script(config: &str, report: &str) -> String {
    format!(
        r#"if [ "$1" = "--print-config" ]; then
  echo '{config}'
  exit 0
fi
cat > /dev/null
echo '{report}'
exit 1"#
    )
}
