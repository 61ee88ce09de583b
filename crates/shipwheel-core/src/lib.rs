#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod build;
mod clean;
mod config;
mod context;
mod errors;
mod outcome;
mod readme;
mod release;

pub const SHIPWHEEL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use build::{build_project, BuildRequest};
pub use clean::{clean_outputs, CleanRequest};
pub use config::{Config, DistConfig, GlobalOptions};
pub use context::{CommandContext, CommandGroup, CommandInfo};
pub use errors::{
    format_status_message, is_missing_project_error, manifest_error_outcome,
    missing_project_outcome, to_json_response, MISSING_PROJECT_HINT, MISSING_PROJECT_MESSAGE,
};
pub use outcome::{CommandStatus, ExecutionOutcome, StepUserError};
pub use readme::{convert_readme, ReadmeRequest};
pub use release::{release_project, ReleaseRequest};
