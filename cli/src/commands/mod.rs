mod compile;
mod dump;
mod matches;
mod split;
mod subst;

pub use compile::*;
pub use dump::*;
pub use matches::*;
pub use split::*;
pub use subst::*;

use std::fs;
use std::io::{stdin, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{arg, command, crate_authors, value_parser, ArgMatches, Command};
use rexp::{MatchFlags, Regex};

use crate::config::Config;
use crate::{commands, help, APP_HELP_TEMPLATE};

pub fn command(name: &'static str) -> Command {
    Command::new(name).help_template(
        r#"{about-with-newline}
{usage-heading}
  {usage}

{all-args}
"#,
    )
}

pub fn cli() -> Command {
    command!()
        .author(crate_authors!("\n")) // requires `cargo` feature
        .arg_required_else_help(true)
        .arg(
            arg!(-C --config <CONFIG_FILE> "Config file")
                .value_parser(existing_path_parser)
                .long_help(help::CONFIG_FILE),
        )
        .arg(
            arg!(--"step-limit" <STEPS>)
                .help("Maximum number of steps for each search")
                .long_help(help::STEP_LIMIT_LONG_HELP)
                .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(--"depth-limit" <DEPTH>)
                .help("Maximum recursion depth for each search")
                .long_help(help::DEPTH_LIMIT_LONG_HELP)
                .value_parser(value_parser!(usize)),
        )
        .help_template(APP_HELP_TEMPLATE)
        .subcommand_required(true)
        .subcommands(vec![
            commands::matches(),
            commands::subst(),
            commands::split(),
            commands::compile(),
            commands::dump(),
        ])
}

/// Adds the arguments shared by the commands that match a regexp against
/// some input: the pattern, the input file and the match flags.
fn with_match_args(command: Command) -> Command {
    command
        .arg(arg!(<PATTERN>).help("Regular expression"))
        // Keep options sorted alphabetically by their long name.
        // For instance, --bar goes before --foo.
        .arg(arg!(-i --"case-insensitive").help("Ignore letter case"))
        .arg(
            arg!(-m --"multiline")
                .help("Make ^ and $ match at line boundaries"),
        )
        .arg(arg!(-s --"single-line").help("Make . match line terminators"))
}

/// Compiles the regexp passed in the `PATTERN` argument, with the flags
/// from the config file plus the ones in the command line.
fn build_regex(args: &ArgMatches, config: &Config) -> anyhow::Result<Regex> {
    let pattern = args.get_one::<String>("PATTERN").unwrap();
    let mut flags = config.matching.flags();

    if args.get_flag("case-insensitive") {
        flags.set(MatchFlags::CaseInsensitive);
    }

    if args.get_flag("multiline") {
        flags.set(MatchFlags::Multiline);
    }

    if args.get_flag("single-line") {
        flags.set(MatchFlags::SingleLine);
    }

    let mut re = Regex::with_flags(pattern, flags)
        .with_context(|| format!("invalid regexp `{}`", pattern))?;

    if let Some(limit) = config.matching.step_limit {
        re = re.step_limit(limit);
    }

    if config.matching.depth_limit > 0 {
        re = re.depth_limit(config.matching.depth_limit);
    }

    Ok(re)
}

/// Reads the whole input from the file in the `FILE` argument, or from the
/// standard input if there's no such argument. Invalid UTF-8 sequences are
/// replaced with U+FFFD.
fn read_input(args: &ArgMatches) -> anyhow::Result<String> {
    let bytes = match args.get_one::<PathBuf>("FILE") {
        Some(path) => fs::read(path)
            .with_context(|| format!("can not read `{}`", path.display()))?,
        None => {
            let mut bytes = Vec::new();
            stdin()
                .read_to_end(&mut bytes)
                .context("can not read the standard input")?;
            bytes
        }
    };

    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// Parses a path and makes sure that it exists.
fn existing_path_parser(input: &str) -> Result<PathBuf, anyhow::Error> {
    let path = PathBuf::from(input);
    if path.try_exists()? {
        Ok(path)
    } else {
        Err(anyhow!("file not found"))
    }
}
