use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::build::{relative_path_str, resolve_output_dir};
use crate::context::CommandContext;
use crate::outcome::ExecutionOutcome;

#[derive(Clone, Debug, Default)]
pub struct CleanRequest {
    pub out: Option<PathBuf>,
}

/// Removes stale build outputs so the next build starts from a clean slate.
///
/// Targets: the artifact output directory (`dist/` unless overridden), the
/// legacy `build/` directory, and `*.egg-info` / `*.dist-info` metadata
/// directories at the project root. Absent targets are a no-op.
///
/// # Errors
/// Returns an error if the project root cannot be resolved or a removal
/// fails (for example on permissions).
pub fn clean_outputs(ctx: &CommandContext, request: &CleanRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let out_dir = resolve_output_dir(ctx, &root, request.out.as_deref());
    let removed = remove_stale_outputs(&root, &out_dir)?;

    let removed_rel: Vec<String> = removed
        .iter()
        .map(|path| relative_path_str(path, &root))
        .collect();
    let message = if removed_rel.is_empty() {
        "nothing to clean".to_string()
    } else {
        format!("removed {}", removed_rel.join(", "))
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({ "removed": removed_rel }),
    ))
}

pub(crate) fn remove_stale_outputs(root: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for dir in [out_dir.to_path_buf(), root.join("build")] {
        if dir.is_dir() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
            tracing::debug!(path = %dir.display(), "removed stale output directory");
            removed.push(dir);
        }
    }
    for entry in fs::read_dir(root).with_context(|| format!("reading {}", root.display()))? {
        let path = entry?.path();
        if path.is_dir() && is_metadata_dir(&path) {
            fs::remove_dir_all(&path)
                .with_context(|| format!("removing {}", path.display()))?;
            tracing::debug!(path = %path.display(), "removed stale metadata directory");
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

fn is_metadata_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".egg-info") || name.ends_with(".dist-info"))
}
