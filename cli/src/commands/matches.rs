use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use rexp::{MatchError, Regex};
use yansi::Color::{Green, Red};
use yansi::Paint;

use crate::commands::{build_regex, read_input, with_match_args};
use crate::config::Config;
use crate::help;

pub fn matches() -> Command {
    with_match_args(
        super::command("match")
            .about("Print the lines that contain a match")
            .long_about(help::MATCH_LONG_HELP),
    )
    .arg(
        arg!([FILE])
            .help("Path to the input file")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(arg!(-c --"count").help("Print only the number of matching lines"))
    .arg(arg!(-n --"line-number").help("Print the line number of each line"))
}

pub fn exec_match(args: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let re = build_regex(args, config)?;
    let input = read_input(args)?;
    let count_only = args.get_flag("count");
    let line_numbers = args.get_flag("line-number");

    let mut output = BufWriter::new(stdout().lock());
    let mut count = 0;

    for (i, line) in input.lines().enumerate() {
        let matched = re
            .try_is_match(line)
            .with_context(|| format!("can not search line {}", i + 1))?;

        if !matched {
            continue;
        }

        count += 1;

        if count_only {
            continue;
        }

        if line_numbers {
            write!(output, "{}:", (i + 1).paint(Green))?;
        }

        let line = highlight(&re, line)
            .with_context(|| format!("can not search line {}", i + 1))?;

        writeln!(output, "{}", line)?;
    }

    if count_only {
        writeln!(output, "{}", count)?;
    }

    output.flush()?;
    Ok(())
}

/// Returns `line` with every match painted. When colors are disabled the
/// line is returned as is.
fn highlight(re: &Regex, line: &str) -> Result<String, MatchError> {
    if !yansi::is_enabled() {
        return Ok(line.to_string());
    }

    let mut result = String::with_capacity(line.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(captures) = re.try_captures_at(line, pos)? {
        let (Some((start, end)), Some((byte_start, byte_end))) =
            (captures.span(0), captures.byte_span(0))
        else {
            break;
        };

        result.push_str(&line[last..byte_start]);
        let matched = &line[byte_start..byte_end];
        result.push_str(&matched.paint(Red).bold().to_string());
        last = byte_end;

        pos = if end > start { end } else { end + 1 };
    }

    result.push_str(&line[last..]);
    Ok(result)
}
