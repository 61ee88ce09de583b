use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

/// Resolves the project root for the current working directory.
///
/// # Errors
/// Returns an error if the working directory cannot be inspected or no
/// `pyproject.toml` exists in it or any ancestor.
pub fn current_project_root() -> Result<PathBuf> {
    match discover_project_root()? {
        Some(root) => Ok(root),
        None => Err(anyhow!(
            "No Python project found. Run shipwheel from a directory containing pyproject.toml."
        )),
    }
}

/// Walks up from the working directory to the nearest directory containing
/// `pyproject.toml`.
pub fn discover_project_root() -> Result<Option<PathBuf>> {
    let mut dir = env::current_dir().context("unable to determine project root")?;
    loop {
        if dir.join("pyproject.toml").exists() {
            return Ok(Some(dir));
        }
        if !dir.pop() {
            break;
        }
    }
    Ok(None)
}
