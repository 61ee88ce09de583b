use color_eyre::Result;
use shipwheel_core::{
    build_project, clean_outputs, convert_readme, is_missing_project_error,
    manifest_error_outcome, missing_project_outcome, release_project, BuildRequest, CleanRequest,
    CommandContext, CommandGroup, CommandInfo, ExecutionOutcome, ReadmeRequest, ReleaseRequest,
    StepUserError,
};

use crate::cli::{BuildArgs, BuildFormat, CleanArgs, CommandGroupCli, ReadmeArgs, ReleaseArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    match group {
        CommandGroupCli::Release(args) => {
            let info = CommandInfo::new(CommandGroup::Release, "release");
            let request = release_request_from_args(args);
            core_call(info, || release_project(ctx, &request))
        }
        CommandGroupCli::Readme(args) => {
            let info = CommandInfo::new(CommandGroup::Readme, "readme");
            let request = readme_request_from_args(args);
            core_call(info, || convert_readme(ctx, &request))
        }
        CommandGroupCli::Clean(args) => {
            let info = CommandInfo::new(CommandGroup::Clean, "clean");
            let request = clean_request_from_args(args);
            core_call(info, || clean_outputs(ctx, &request))
        }
        CommandGroupCli::Build(args) => {
            let info = CommandInfo::new(CommandGroup::Build, "build");
            let request = build_request_from_args(args);
            core_call(info, || build_project(ctx, &request))
        }
    }
}

fn release_request_from_args(args: &ReleaseArgs) -> ReleaseRequest {
    ReleaseRequest {
        include_sdist: args.sdist,
        out: args.out.clone(),
    }
}

fn readme_request_from_args(args: &ReadmeArgs) -> ReadmeRequest {
    ReadmeRequest {
        source: args.source.clone(),
        output: args.output.clone(),
    }
}

fn clean_request_from_args(args: &CleanArgs) -> CleanRequest {
    CleanRequest {
        out: args.out.clone(),
    }
}

fn build_request_from_args(args: &BuildArgs) -> BuildRequest {
    let (include_sdist, include_wheel) = match args.format {
        Some(BuildFormat::Sdist) => (true, false),
        Some(BuildFormat::Both) => (true, true),
        Some(BuildFormat::Wheel) | None => (false, true),
    };
    BuildRequest {
        include_sdist,
        include_wheel,
        out: args.out.clone(),
        dry_run: args.dry_run,
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    let outcome = action();
    match outcome {
        Ok(result) => Ok((info, result)),
        Err(err) => {
            if is_missing_project_error(&err) {
                Ok((info, missing_project_outcome()))
            } else if let Some(outcome) = manifest_error_outcome(&err) {
                Ok((info, outcome))
            } else if let Some(user) = err.downcast_ref::<StepUserError>() {
                Ok((
                    info,
                    ExecutionOutcome::user_error(
                        user.message().to_string(),
                        user.details().clone(),
                    ),
                ))
            } else {
                let issues: Vec<String> =
                    err.chain().map(std::string::ToString::to_string).collect();
                Ok((
                    info,
                    ExecutionOutcome::failure(
                        err.to_string(),
                        serde_json::json!({
                            "reason": "internal_error",
                            "error": err.to_string(),
                            "issues": issues,
                            "hint": "Re-run with --trace for more detail, or open an issue if this persists.",
                        }),
                    ),
                ))
            }
        }
    }
}
