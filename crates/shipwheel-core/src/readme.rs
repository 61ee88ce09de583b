use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use shipwheel_domain::markdown_to_rst;

use crate::build::relative_path_str;
use crate::context::CommandContext;
use crate::outcome::ExecutionOutcome;

#[derive(Clone, Debug, Default)]
pub struct ReadmeRequest {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Converts the project readme from Markdown to reStructuredText.
///
/// # Errors
/// Returns an error if the project root cannot be resolved or the converted
/// readme cannot be written.
pub fn convert_readme(ctx: &CommandContext, request: &ReadmeRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let source = resolve_doc_path(&root, request.source.as_deref(), "README.md");
    let output = resolve_doc_path(&root, request.output.as_deref(), "README.rst");

    if !source.is_file() {
        return Ok(ExecutionOutcome::user_error(
            format!("{} not found", relative_path_str(&source, &root)),
            json!({
                "reason": "missing_readme",
                "source": relative_path_str(&source, &root),
                "hint": "Create a Markdown readme or pass --source to point at one.",
            }),
        ));
    }

    let markdown = fs::read_to_string(&source)
        .with_context(|| format!("reading {}", source.display()))?;
    let rst = markdown_to_rst(&markdown);
    fs::write(&output, &rst).with_context(|| format!("writing {}", output.display()))?;
    tracing::debug!(
        source = %source.display(),
        output = %output.display(),
        bytes = rst.len(),
        "converted readme"
    );

    let message = format!(
        "converted {} -> {}",
        relative_path_str(&source, &root),
        relative_path_str(&output, &root)
    );
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "source": relative_path_str(&source, &root),
            "output": relative_path_str(&output, &root),
            "bytes": rst.len(),
        }),
    ))
}

fn resolve_doc_path(root: &Path, requested: Option<&Path>, default_name: &str) -> PathBuf {
    match requested {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => root.join(path),
        None => root.join(default_name),
    }
}
