//! The publish-prep sequence: convert the readme, clean stale outputs, build
//! the wheel. Steps run in that order and the sequence halts at the first
//! step that does not succeed.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::{json, Value};

use crate::build::{build_project, BuildRequest};
use crate::clean::{clean_outputs, CleanRequest};
use crate::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::readme::{convert_readme, ReadmeRequest};

#[derive(Clone, Debug, Default)]
pub struct ReleaseRequest {
    pub include_sdist: bool,
    pub out: Option<PathBuf>,
}

/// Runs the full publish-prep sequence.
///
/// Cleaning runs after conversion (conversion does not need a clean tree)
/// and before the build (the build must never append to stale output). A
/// non-Ok step outcome stops the sequence; completed steps are not rolled
/// back, which is safe because every step is idempotent.
///
/// # Errors
/// Returns an error if a step fails in a way that is not expressed as an
/// outcome (I/O failures, invalid metadata).
pub fn release_project(ctx: &CommandContext, request: &ReleaseRequest) -> Result<ExecutionOutcome> {
    let mut steps: Vec<Value> = Vec::new();

    let readme = convert_readme(ctx, &ReadmeRequest::default())?;
    push_step(&mut steps, "readme", &readme);
    if !readme.is_ok() {
        return Ok(halted("readme", readme, steps));
    }

    let clean = clean_outputs(
        ctx,
        &CleanRequest {
            out: request.out.clone(),
        },
    )?;
    push_step(&mut steps, "clean", &clean);
    if !clean.is_ok() {
        return Ok(halted("clean", clean, steps));
    }

    let build = build_project(
        ctx,
        &BuildRequest {
            include_sdist: request.include_sdist,
            include_wheel: true,
            out: request.out.clone(),
            dry_run: false,
        },
    )?;
    push_step(&mut steps, "build", &build);
    if !build.is_ok() {
        return Ok(halted("build", build, steps));
    }

    tracing::debug!("release sequence finished");
    let mut details = build.details.clone();
    if let Some(map) = details.as_object_mut() {
        map.insert("steps".to_string(), Value::Array(steps));
    }
    Ok(ExecutionOutcome::success(build.message, details))
}

fn push_step(steps: &mut Vec<Value>, name: &str, outcome: &ExecutionOutcome) {
    steps.push(json!({
        "step": name,
        "status": outcome.status,
        "message": outcome.message,
    }));
}

fn halted(step: &str, outcome: ExecutionOutcome, steps: Vec<Value>) -> ExecutionOutcome {
    let mut details = outcome.details;
    if let Some(map) = details.as_object_mut() {
        map.insert("halted_at".to_string(), Value::String(step.to_string()));
        map.insert("steps".to_string(), Value::Array(steps));
    }
    ExecutionOutcome {
        status: outcome.status,
        message: format!("halted at {step}: {}", outcome.message),
        details,
    }
}
