#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod manifest;
pub mod project;
pub mod readme;

pub use manifest::{load_project_metadata, normalize_package_name, ProjectMetadata};
pub use project::{current_project_root, discover_project_root};
pub use readme::markdown_to_rst;
