//! Script stages and the per-process script registry.
//!
//! Scripts are plain executable files grouped into three ordered stages.
//! Ordering within a stage is significant and preserved from registration.

mod executor;
mod report;

pub use executor::{StageExecutor, StageRun};
pub use report::{PipelineRun, ScriptOutput, ScriptStatus, StatusReport};

use parking_lot::RwLock;
use std::path::PathBuf;

/// Event category emitted when the whole pipeline succeeds.
pub const SUCCEEDED_SCOPE: &str = "process-succeeded";

/// A pipeline stage. Stages always run in the order Pre, Main, Post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Preparation scripts, run first.
    Pre,
    /// The main (deploy) scripts. At least one must be registered.
    Main,
    /// Cleanup scripts, run last.
    Post,
}

impl Stage {
    /// All stages in execution order.
    pub const ORDER: [Self; 3] = [Self::Pre, Self::Main, Self::Post];

    /// The status code reported when this stage fails.
    #[must_use]
    pub const fn failure_code(self) -> u16 {
        match self {
            Self::Pre => 550,
            Self::Main => 551,
            Self::Post => 552,
        }
    }

    /// The event category emitted when this stage fails.
    #[must_use]
    pub const fn failure_scope(self) -> &'static str {
        match self {
            Self::Pre => "pre-process-failed",
            Self::Main => "main-process-failed",
            Self::Post => "post-process-failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pre => "pre",
            Self::Main => "main",
            Self::Post => "post",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct StageLists {
    pre: Vec<PathBuf>,
    main: Vec<PathBuf>,
    post: Vec<PathBuf>,
}

impl StageLists {
    fn list(&self, stage: Stage) -> &Vec<PathBuf> {
        match stage {
            Stage::Pre => &self.pre,
            Stage::Main => &self.main,
            Stage::Post => &self.post,
        }
    }

    fn list_mut(&mut self, stage: Stage) -> &mut Vec<PathBuf> {
        match stage {
            Stage::Pre => &mut self.pre,
            Stage::Main => &mut self.main,
            Stage::Post => &mut self.post,
        }
    }
}

/// Ordered script lists for the three stages.
///
/// One registry is constructed per process and shared by reference between
/// the configuration loader and the pipeline runner. Reads take a snapshot,
/// so a concurrent `add` never tears a running stage.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    lists: RwLock<StageLists>,
}

impl ScriptRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a script path to a stage list.
    ///
    /// An empty path is ignored, leaving the list unchanged.
    pub fn add(&self, stage: Stage, path: impl Into<PathBuf>) {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return;
        }
        self.lists.write().list_mut(stage).push(path);
    }

    /// Returns a snapshot of a stage's script list, in registration order.
    #[must_use]
    pub fn scripts(&self, stage: Stage) -> Vec<PathBuf> {
        self.lists.read().list(stage).clone()
    }

    /// Returns the number of scripts registered for a stage.
    #[must_use]
    pub fn len(&self, stage: Stage) -> usize {
        self.lists.read().list(stage).len()
    }

    /// Returns true if no scripts are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let lists = self.lists.read();
        lists.pre.is_empty() && lists.main.is_empty() && lists.post.is_empty()
    }

    /// Returns true if at least one main script is registered.
    ///
    /// A pipeline without a main script is a configuration error and must be
    /// rejected before any stage runs.
    #[must_use]
    pub fn has_main(&self) -> bool {
        !self.lists.read().main.is_empty()
    }

    /// Clears every stage list. Used for process reinitialization.
    pub fn reset(&self) {
        let mut lists = self.lists.write();
        lists.pre.clear();
        lists.main.clear();
        lists.post.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stage_order_is_pre_main_post() {
        assert_eq!(Stage::ORDER, [Stage::Pre, Stage::Main, Stage::Post]);
    }

    #[test]
    fn stage_codes_and_scopes() {
        assert_eq!(Stage::Pre.failure_code(), 550);
        assert_eq!(Stage::Main.failure_code(), 551);
        assert_eq!(Stage::Post.failure_code(), 552);
        assert_eq!(Stage::Main.failure_scope(), "main-process-failed");
        assert_eq!(Stage::Pre.to_string(), "pre");
    }

    #[test]
    fn add_preserves_registration_order() {
        let registry = ScriptRegistry::new();
        registry.add(Stage::Pre, "/scripts/10-init.sh");
        registry.add(Stage::Pre, "/scripts/20-check.sh");

        let scripts = registry.scripts(Stage::Pre);
        assert_eq!(
            scripts,
            vec![
                PathBuf::from("/scripts/10-init.sh"),
                PathBuf::from("/scripts/20-check.sh"),
            ]
        );
    }

    #[test]
    fn empty_path_is_a_noop() {
        let registry = ScriptRegistry::new();
        registry.add(Stage::Main, "");
        assert_eq!(registry.len(Stage::Main), 0);
        assert!(!registry.has_main());
    }

    #[test]
    fn reset_clears_every_stage() {
        let registry = ScriptRegistry::new();
        registry.add(Stage::Pre, "/a.sh");
        registry.add(Stage::Main, "/b.sh");
        registry.add(Stage::Post, "/c.sh");
        assert!(registry.has_main());

        registry.reset();
        assert!(!registry.has_main());
        assert!(registry.is_empty());
    }
}
