//! Startup configuration: script folders and hook subscriptions.
//!
//! The YAML file names one folder per stage and the (url, scope) pairs to
//! subscribe. Applying a config is all-or-nothing at process startup: a
//! missing main script or a failing subscription is fatal.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::notify::NotificationHub;
use crate::scripts::{ScriptRegistry, Stage};

/// One subscriber declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct HookConfig {
    /// The subscriber endpoint URL.
    pub url: String,
    /// The scope pattern the subscriber declares.
    pub scope: String,
}

/// The startup configuration file.
///
/// ```yaml
/// pre_script_folder: /opt/scripts/pre
/// main_script_folder: /opt/scripts/deploy
/// post_script_folder: /opt/scripts/post
/// hooks:
///   - url: https://ci.example.com/callback
///     scope: "*"
///   - url: kafka://broker:9092?topic=deploys
///     scope: process-failed
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Folder scanned into the pre stage.
    #[serde(default)]
    pub pre_script_folder: Option<PathBuf>,
    /// Folder scanned into the main stage.
    #[serde(default)]
    pub main_script_folder: Option<PathBuf>,
    /// Folder scanned into the post stage.
    #[serde(default)]
    pub post_script_folder: Option<PathBuf>,
    /// Subscribers registered at startup.
    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

impl Config {
    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Populates the script registry and subscribes the configured hooks.
    ///
    /// Folder entries are registered sorted by file name, subdirectories
    /// skipped. Fails after scanning when no main script was found, and on
    /// the first hook whose subscription is refused; both are fatal to
    /// startup by contract.
    pub fn apply(
        &self,
        scripts: &ScriptRegistry,
        hub: &NotificationHub,
    ) -> Result<(), ConfigError> {
        let folders = [
            (Stage::Pre, &self.pre_script_folder),
            (Stage::Main, &self.main_script_folder),
            (Stage::Post, &self.post_script_folder),
        ];
        for (stage, folder) in folders {
            if let Some(folder) = folder {
                register_folder(scripts, stage, folder)?;
            }
        }
        if !scripts.has_main() {
            return Err(ConfigError::NoMainScript);
        }

        for hook in &self.hooks {
            hub.subscribe(&hook.url, &hook.scope)?;
        }
        info!(
            pre = scripts.len(Stage::Pre),
            main = scripts.len(Stage::Main),
            post = scripts.len(Stage::Post),
            hooks = self.hooks.len(),
            "configuration applied"
        );
        Ok(())
    }
}

/// Registers every regular file in a folder, sorted by file name.
fn register_folder(
    scripts: &ScriptRegistry,
    stage: Stage,
    folder: &Path,
) -> Result<(), ConfigError> {
    let read_err = |source| ConfigError::Folder {
        path: folder.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let is_dir = entry.file_type().map_err(read_err)?.is_dir();
        if is_dir {
            debug!(path = %entry.path().display(), "skipping subdirectory");
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();

    for path in entries {
        debug!(stage = %stage, path = %path.display(), "script registered");
        scripts.add(stage, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingProvider;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn hub() -> NotificationHub {
        let hub = NotificationHub::new();
        hub.register_provider("test", Arc::new(RecordingProvider::new()));
        hub
    }

    #[test]
    fn parses_a_full_config() {
        let yaml = r#"
pre_script_folder: /opt/pre
main_script_folder: /opt/main
hooks:
  - url: test://ci/callback
    scope: "*"
  - url: test://audit
    scope: process-failed
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pre_script_folder, Some(PathBuf::from("/opt/pre")));
        assert_eq!(config.main_script_folder, Some(PathBuf::from("/opt/main")));
        assert!(config.post_script_folder.is_none());
        assert_eq!(config.hooks.len(), 2);
        assert_eq!(config.hooks[1].scope, "process-failed");
    }

    #[test]
    fn folder_scan_sorts_by_name_and_skips_subdirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("20-second.sh"), "").unwrap();
        std::fs::write(dir.path().join("10-first.sh"), "").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let config = Config {
            main_script_folder: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let scripts = ScriptRegistry::new();
        config.apply(&scripts, &hub()).unwrap();

        let registered = scripts.scripts(Stage::Main);
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0], dir.path().join("10-first.sh"));
        assert_eq!(registered[1], dir.path().join("20-second.sh"));
    }

    #[test]
    fn missing_main_script_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("only-pre.sh"), "").unwrap();

        let config = Config {
            pre_script_folder: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let scripts = ScriptRegistry::new();
        let err = config.apply(&scripts, &hub()).unwrap_err();
        assert!(matches!(err, ConfigError::NoMainScript));
    }

    #[test]
    fn unreadable_folder_is_fatal() {
        let config = Config {
            main_script_folder: Some(PathBuf::from("/definitely/not/here")),
            ..Config::default()
        };
        let err = config.apply(&ScriptRegistry::new(), &hub()).unwrap_err();
        assert!(matches!(err, ConfigError::Folder { .. }));
    }

    #[test]
    fn failing_hook_subscription_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.sh"), "").unwrap();

        let config = Config {
            main_script_folder: Some(dir.path().to_path_buf()),
            hooks: vec![HookConfig {
                url: "gopher://nobody".to_string(),
                scope: "*".to_string(),
            }],
            ..Config::default()
        };
        let hub = hub();
        let err = config.apply(&ScriptRegistry::new(), &hub).unwrap_err();
        assert!(matches!(err, ConfigError::Subscribe(_)));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn hooks_subscribe_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.sh"), "").unwrap();

        let config = Config {
            main_script_folder: Some(dir.path().to_path_buf()),
            hooks: vec![
                HookConfig {
                    url: "test://one".to_string(),
                    scope: "*".to_string(),
                },
                HookConfig {
                    url: "test://two".to_string(),
                    scope: "^process-succeeded$".to_string(),
                },
            ],
            ..Config::default()
        };
        let hub = hub();
        config.apply(&ScriptRegistry::new(), &hub).unwrap();
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn from_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "main_script_folder: /opt/main\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.main_script_folder, Some(PathBuf::from("/opt/main")));

        let err = Config::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
