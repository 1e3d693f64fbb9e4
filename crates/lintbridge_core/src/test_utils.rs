use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A shell script standing in for the engine executable.
pub struct FakeEngine {
    _dir: TempDir,
    path: PathBuf,
}

impl FakeEngine {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes an executable `/bin/sh` script with the given body.
pub fn fake_engine(body: &str) -> FakeEngine {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("engine");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake engine");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake engine executable");
    FakeEngine { _dir: dir, path }
}

/// A one-message report for `path`, as printed by `--format=json`.
pub fn report_json(path: &str) -> String {
    format!(
        r#"[{{"filePath":"{path}","messages":[{{"ruleId":"no-var","severity":2,"message":"Unexpected var, use let or const instead.","line":1,"column":1,"endLine":1,"endColumn":11,"fix":{{"range":[0,3],"text":"let"}}}}],"errorCount":1,"warningCount":0,"fixableErrorCount":1,"fixableWarningCount":0}}]"#
    )
}
