use atty::Stream;
use clap::Parser;
use color_eyre::Result;
use serde_json::Value;
use shipwheel_core::{
    to_json_response, CommandContext, CommandInfo, CommandStatus, ExecutionOutcome, GlobalOptions,
};

mod cli;
mod dispatch;
mod style;

use cli::{CommandGroupCli, ReleaseArgs, ShipwheelCli};
use dispatch::dispatch_command;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = ShipwheelCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
    };
    let ctx = CommandContext::new(&global);

    // bare `shipwheel` runs the full publish-prep sequence
    let command = cli
        .command
        .unwrap_or_else(|| CommandGroupCli::Release(ReleaseArgs::default()));
    let (info, outcome) = dispatch_command(&ctx, &command)?;
    let code = emit_output(cli.json, cli.quiet, cli.no_color, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter =
        format!("shipwheel={level},shipwheel_cli={level},shipwheel_core={level},shipwheel_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(
    json: bool,
    quiet: bool,
    no_color: bool,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = match outcome.status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    };

    let style = Style::new(no_color, atty::is(Stream::Stdout));

    if json {
        let payload = to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !quiet {
        let message = shipwheel_core::format_status_message(info, &outcome.message);
        println!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            println!("{}", style.info(&hint_line));
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
