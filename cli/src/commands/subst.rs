use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use rexp::{ReplaceFlagSet, ReplaceFlags};

use crate::commands::{build_regex, read_input, with_match_args};
use crate::config::Config;
use crate::help;

pub fn subst() -> Command {
    with_match_args(
        super::command("subst")
            .about("Replace the matches of a regular expression")
            .long_about(help::SUBST_LONG_HELP),
    )
    .arg(arg!(<REPLACEMENT>).help("Text that replaces each match"))
    .arg(
        arg!([FILE])
            .help("Path to the input file")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(arg!(--"first").help("Replace only the first match"))
    .arg(
        arg!(--"literal")
            .help("Don't expand $0 to $9 in the replacement"),
    )
}

pub fn exec_subst(args: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let re = build_regex(args, config)?;
    let replacement = args.get_one::<String>("REPLACEMENT").unwrap();
    let input = read_input(args)?;

    let mut flags = ReplaceFlagSet::none();

    if args.get_flag("first") {
        flags.set(ReplaceFlags::FirstOnly);
    }

    if !args.get_flag("literal") {
        flags.set(ReplaceFlags::Backreferences);
    }

    let output = re
        .try_subst(&input, replacement, flags)
        .context("can not replace the matches")?;

    let mut stdout = stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
