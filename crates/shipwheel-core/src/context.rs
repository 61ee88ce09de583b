use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Result;
use shipwheel_domain::current_project_root;

use crate::config::{Config, EnvSnapshot, GlobalOptions};

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandGroup {
    Release,
    Readme,
    Clean,
    Build,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Release => "release",
            CommandGroup::Readme => "readme",
            CommandGroup::Clean => "clean",
            CommandGroup::Build => "build",
        };
        f.write_str(name)
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    project_root: OnceLock<PathBuf>,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    pub fn new(global: &'a GlobalOptions) -> Self {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env);
        Self {
            global,
            config,
            project_root: OnceLock::new(),
        }
    }

    /// Resolves the current project's root directory.
    ///
    /// # Errors
    /// Returns an error if no `pyproject.toml` is found in the working
    /// directory or any ancestor.
    pub fn project_root(&self) -> Result<PathBuf> {
        if let Some(path) = self.project_root.get() {
            Ok(path.clone())
        } else {
            let path = current_project_root()?;
            let _ = self.project_root.set(path.clone());
            Ok(path)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn testing(global: &'a GlobalOptions, root: PathBuf) -> Self {
        let ctx = Self::new(global);
        let _ = ctx.project_root.set(root);
        ctx
    }
}
