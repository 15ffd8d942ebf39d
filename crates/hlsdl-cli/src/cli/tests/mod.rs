//! CLI parse tests.

use super::{Cli, CliCommand, DownArgs};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

pub(super) fn parse_down(args: &[&str]) -> DownArgs {
    match parse(args) {
        CliCommand::Down(a) => a,
    }
}
