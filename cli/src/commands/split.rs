use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};

use crate::commands::{build_regex, read_input, with_match_args};
use crate::config::Config;
use crate::help;

pub fn split() -> Command {
    with_match_args(
        super::command("split")
            .about("Split the input around the matches of a regular expression")
            .long_about(help::SPLIT_LONG_HELP),
    )
    .arg(
        arg!([FILE])
            .help("Path to the input file")
            .value_parser(value_parser!(PathBuf)),
    )
}

pub fn exec_split(args: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let re = build_regex(args, config)?;
    let input = read_input(args)?;

    let input = input
        .strip_suffix("\r\n")
        .or_else(|| input.strip_suffix('\n'))
        .unwrap_or(&input);

    let pieces = re.try_split(input).context("can not split the input")?;
    let mut output = BufWriter::new(stdout().lock());

    for piece in pieces {
        writeln!(output, "{}", piece)?;
    }

    output.flush()?;
    Ok(())
}
