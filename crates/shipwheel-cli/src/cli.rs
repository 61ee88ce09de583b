use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

pub const SHIPWHEEL_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const SHIPWHEEL_BEFORE_HELP: &str = concat!(
    "shipwheel ",
    env!("CARGO_PKG_VERSION"),
    " – Publish-prep for Python packages\n\n",
    "\x1b[1;36mCore workflow\x1b[0m\n",
    "  release          Convert the readme, clean stale outputs, build the wheel (default).\n\n",
    "\x1b[1;36mIndividual steps\x1b[0m\n",
    "  readme           Convert README.md to README.rst for package-index display.\n",
    "  clean            Remove dist/, build/, and *.egg-info / *.dist-info directories.\n",
    "  build            Build a wheel (and optionally an sdist) from pyproject.toml.\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = SHIPWHEEL_BEFORE_HELP,
    help_template = SHIPWHEEL_HELP_TEMPLATE
)]
pub struct ShipwheelCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Option<CommandGroupCli>,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Run the full publish-prep sequence: readme, clean, build.",
        override_usage = "shipwheel release [--sdist] [--out DIR]"
    )]
    Release(ReleaseArgs),
    #[command(
        about = "Convert the Markdown readme to reStructuredText.",
        override_usage = "shipwheel readme [--source FILE] [--output FILE]"
    )]
    Readme(ReadmeArgs),
    #[command(
        about = "Remove stale build outputs; a no-op when none exist.",
        override_usage = "shipwheel clean [--out DIR]"
    )]
    Clean(CleanArgs),
    #[command(
        about = "Build distribution artifacts from pyproject.toml.",
        override_usage = "shipwheel build [wheel|sdist|both] [--out DIR] [--dry-run]"
    )]
    Build(BuildArgs),
}

#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    #[arg(long, help = "Also build a source distribution")]
    pub sdist: bool,
    #[arg(long, value_name = "DIR", help = "Artifact output directory (default: dist)")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct ReadmeArgs {
    #[arg(long, value_name = "FILE", help = "Markdown readme to convert (default: README.md)")]
    pub source: Option<PathBuf>,
    #[arg(long, value_name = "FILE", help = "Converted output path (default: README.rst)")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    #[arg(long, value_name = "DIR", help = "Artifact output directory (default: dist)")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    #[arg(value_enum, help = "Artifact format to build (default: wheel)")]
    pub format: Option<BuildFormat>,
    #[arg(long, value_name = "DIR", help = "Artifact output directory (default: dist)")]
    pub out: Option<PathBuf>,
    #[arg(long, help = "Report what would be built without writing anything")]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BuildFormat {
    Wheel,
    Sdist,
    Both,
}
