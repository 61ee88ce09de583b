use serde_json::{json, Value};
use toml_edit::TomlError;

use crate::context::CommandInfo;
use crate::outcome::{CommandStatus, ExecutionOutcome};

pub const MISSING_PROJECT_MESSAGE: &str = "No Python project found.";
pub const MISSING_PROJECT_HINT: &str =
    "Run shipwheel from a directory containing pyproject.toml.";

pub fn missing_project_outcome() -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        MISSING_PROJECT_MESSAGE,
        json!({
            "reason": "missing_project",
            "hint": MISSING_PROJECT_HINT,
        }),
    )
}

pub fn is_missing_project_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("No Python project found"))
}

pub fn manifest_error_outcome(err: &anyhow::Error) -> Option<ExecutionOutcome> {
    if let Some(field) = err
        .chain()
        .map(ToString::to_string)
        .find(|msg| msg.starts_with("pyproject missing "))
    {
        return Some(ExecutionOutcome::user_error(
            field.clone(),
            json!({
                "reason": "invalid_metadata",
                "error": field,
                "hint": "Add the missing field to [project] in pyproject.toml and rerun.",
            }),
        ));
    }

    let parse_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<TomlError>().map(ToString::to_string))?;

    Some(ExecutionOutcome::user_error(
        "pyproject.toml is not valid TOML",
        json!({
            "reason": "invalid_manifest",
            "error": parse_error,
            "hint": "Fix pyproject.toml syntax and rerun the command.",
        }),
    ))
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome, _code: i32) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("shipwheel {}", info.name)
    } else {
        format!("shipwheel {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}
