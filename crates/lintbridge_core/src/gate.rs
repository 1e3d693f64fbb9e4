//! Plugin gate: checks that the engine can parse a syntax before linting it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::LintError;
use crate::cancel::{CancelSignal, Outcome};
use crate::engine::{Engine, EngineExit, required_plugin};
use crate::process::{self, ProcessRun};

/// The part of the engine's effective configuration the gate needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EffectiveConfig {
    #[serde(default, deserialize_with = "deserialize_plugins")]
    pub plugins: BTreeSet<String>,
}

impl EffectiveConfig {
    /// Parses `--print-config` output.
    pub fn from_json(json: &str) -> Result<Self, LintError> {
        serde_json::from_str(json)
            .map_err(|e| LintError::output(format!("invalid config dump: {e}")))
    }

    /// Returns true if the plugin is configured.
    ///
    /// Accepts the short name (`vue`), the package name
    /// (`eslint-plugin-vue`) and the flat config form
    /// (`vue:eslint-plugin-vue@9.0.0`).
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|entry| {
            let id = entry.split_once(':').map_or(entry.as_str(), |(id, _)| id);
            let id = id.strip_prefix("eslint-plugin-").unwrap_or(id);
            id == name
        })
    }
}

/// Old engines print `plugins` as a list, some newer ones as an object
/// keyed by plugin name.
fn deserialize_plugins<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Plugins {
        List(Vec<String>),
        Map(serde_json::Map<String, serde_json::Value>),
        None(()),
    }

    Ok(match Plugins::deserialize(deserializer)? {
        Plugins::List(list) => list.into_iter().collect(),
        Plugins::Map(map) => map.into_iter().map(|(name, _)| name).collect(),
        Plugins::None(()) => BTreeSet::new(),
    })
}

/// The gate's decision for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// The required plugin is configured.
    Satisfied,
    /// The required plugin is missing.
    Unsatisfied { plugin: String },
    /// The syntax needs no plugin; nothing was spawned.
    Skipped,
}

impl GateVerdict {
    /// Returns true if linting may proceed.
    pub fn allows_lint(&self) -> bool {
        !matches!(self, GateVerdict::Unsatisfied { .. })
    }
}

/// Runs `--print-config` to decide whether a syntax can be linted.
#[derive(Debug)]
pub struct ConfigGate<'a> {
    engine: &'a Engine,
}

impl<'a> ConfigGate<'a> {
    /// Creates a gate for the given engine.
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Checks whether documents of `syntax` at `path` can be linted.
    ///
    /// `path` is `None` for untitled documents; a synthetic file name with
    /// the syntax's extension is used then.
    pub async fn check(
        &self,
        syntax: &str,
        path: Option<&Path>,
        cancel: &CancelSignal,
    ) -> Result<Outcome<GateVerdict>, LintError> {
        let Some(plugin) = required_plugin(syntax) else {
            debug!("No plugin required for {}, skipping config check", syntax);
            return Ok(Outcome::Finished(GateVerdict::Skipped));
        };

        let path: PathBuf = match path {
            Some(path) => path.to_path_buf(),
            None => self.engine.untitled_path(syntax),
        };

        let program = self.engine.program();
        let command = self.engine.command(self.engine.print_config_args(&path));
        let limit = self.engine.settings().max_output_bytes;

        let captured = match process::run(command, &program, None, limit, cancel).await? {
            ProcessRun::Exited(captured) => captured,
            ProcessRun::Canceled => return Ok(Outcome::Canceled),
        };

        match EngineExit::from_status(&captured.status) {
            EngineExit::Clean => {}
            EngineExit::Terminated => {
                debug!("Config check for {} was terminated", path.display());
                return Ok(Outcome::Canceled);
            }
            EngineExit::IssuesFound | EngineExit::Failed(_) => {
                warn!("Config check failed for {}: {}", path.display(), captured.stderr.trim());
                return Err(LintError::ConfigFetch {
                    path,
                    code: captured.status.code(),
                    stderr: captured.stderr,
                });
            }
        }

        let config = EffectiveConfig::from_json(&captured.stdout)?;
        if config.has_plugin(plugin) {
            Ok(Outcome::Finished(GateVerdict::Satisfied))
        } else {
            debug!("Plugin {} not configured for {}", plugin, path.display());
            Ok(Outcome::Finished(GateVerdict::Unsatisfied {
                plugin: plugin.to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"plugins": ["html", "import"]}"#, "html", true)]
    #[case(r#"{"plugins": ["eslint-plugin-vue"]}"#, "vue", true)]
    #[case(r#"{"plugins": ["@", "markdown:@eslint/markdown@6.2.0"]}"#, "markdown", true)]
    #[case(r#"{"plugins": {"vue": {}, "import": {}}}"#, "vue", true)]
    #[case(r#"{"plugins": ["import"]}"#, "vue", false)]
    #[case(r#"{"plugins": null}"#, "html", false)]
    #[case(r#"{"rules": {}}"#, "html", false)]
    fn detects_plugins(#[case] json: &str, #[case] plugin: &str, #[case] expected: bool) {
        let config = EffectiveConfig::from_json(json).unwrap();
        assert_eq!(config.has_plugin(plugin), expected);
    }

    #[test]
    fn invalid_dump_is_an_output_error() {
        let err = EffectiveConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, LintError::Output(_)));
    }

    #[test]
    fn only_unsatisfied_blocks_lint() {
        assert!(GateVerdict::Skipped.allows_lint());
        assert!(GateVerdict::Satisfied.allows_lint());
        assert!(
            !GateVerdict::Unsatisfied {
                plugin: "vue".into()
            }
            .allows_lint()
        );
    }

    #[cfg(unix)]
    mod with_engine {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::settings::EngineSettings;
        use crate::test_utils::fake_engine;
        use std::sync::Arc;
        use std::time::Duration;

        fn engine_at(path: &Path) -> Engine {
            let mut settings = EngineSettings::default();
            settings.executable = path.to_path_buf();
            Engine::new(Arc::new(settings))
        }

        #[tokio::test]
        async fn ungated_syntax_never_spawns() {
            // An executable that does not exist would fail if spawned.
            let engine = engine_at(Path::new("/nonexistent/engine"));
            let outcome = ConfigGate::new(&engine)
                .check("javascript", Some(Path::new("/work/a.js")), &CancelSignal::new())
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::Finished(GateVerdict::Skipped));
        }

        #[tokio::test]
        async fn satisfied_when_plugin_is_configured() {
            let fake = fake_engine(
                r#"[ "$1" = "--print-config" ] || exit 2
echo '{"plugins": ["vue"]}'"#,
            );
            let engine = engine_at(fake.path());
            let outcome = ConfigGate::new(&engine)
                .check("vue", Some(Path::new("/work/App.vue")), &CancelSignal::new())
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::Finished(GateVerdict::Satisfied));
        }

        #[tokio::test]
        async fn unsatisfied_names_the_plugin() {
            let fake = fake_engine(r#"echo '{"plugins": ["import"]}'"#);
            let engine = engine_at(fake.path());
            let outcome = ConfigGate::new(&engine)
                .check("markdown", None, &CancelSignal::new())
                .await
                .unwrap();
            assert_eq!(
                outcome,
                Outcome::Finished(GateVerdict::Unsatisfied {
                    plugin: "markdown".to_string()
                })
            );
        }

        #[tokio::test]
        async fn untitled_documents_use_a_synthetic_path() {
            let fake = fake_engine(
                r#"case "$2" in
  *untitled.md) echo '{"plugins": ["markdown"]}' ;;
  *) exit 2 ;;
esac"#,
            );
            let engine = engine_at(fake.path());
            let outcome = ConfigGate::new(&engine)
                .check("markdown", None, &CancelSignal::new())
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::Finished(GateVerdict::Satisfied));
        }

        #[tokio::test]
        async fn unexpected_exit_is_a_config_fetch_failure() {
            let fake = fake_engine("echo 'No ESLint configuration found' >&2; exit 2");
            let engine = engine_at(fake.path());
            let err = ConfigGate::new(&engine)
                .check("html", Some(Path::new("/work/index.html")), &CancelSignal::new())
                .await
                .unwrap_err();
            match err {
                LintError::ConfigFetch { code, stderr, .. } => {
                    assert_eq!(code, Some(2));
                    assert!(stderr.contains("No ESLint configuration found"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn terminated_exit_code_is_canceled() {
            let fake = fake_engine("exit 15");
            let engine = engine_at(fake.path());
            let outcome = ConfigGate::new(&engine)
                .check("vue", Some(Path::new("/work/App.vue")), &CancelSignal::new())
                .await
                .unwrap();
            assert!(outcome.is_canceled());
        }

        #[tokio::test]
        async fn cancel_during_check_is_silent() {
            let fake = fake_engine("echo '{\"plugins\": [\"vue\"]}'; exec sleep 30");
            let engine = engine_at(fake.path());
            let cancel = CancelSignal::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                trigger.cancel();
            });

            let outcome = ConfigGate::new(&engine)
                .check("vue", Some(Path::new("/work/App.vue")), &cancel)
                .await
                .unwrap();
            assert!(outcome.is_canceled());
        }
    }
}
