use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgGroup, ArgMatches, Command};
use rexp::Program;
use yansi::Color::Green;
use yansi::Paint;

use crate::help;

pub fn dump() -> Command {
    super::command("dump")
        .about("Show the program produced for a regular expression")
        .long_about(help::DUMP_LONG_HELP)
        .arg(arg!([PATTERN]).help("Regular expression"))
        .arg(
            arg!(--"compiled" <FILE>)
                .help("Load the program from a file produced by `rx compile`")
                .value_parser(value_parser!(PathBuf)),
        )
        .group(
            ArgGroup::new("source")
                .args(["PATTERN", "compiled"])
                .required(true),
        )
}

pub fn exec_dump(args: &ArgMatches) -> anyhow::Result<()> {
    let program = match args.get_one::<PathBuf>("compiled") {
        Some(path) => {
            let file = File::open(path).with_context(|| {
                format!("can not read `{}`", path.display())
            })?;
            Program::deserialize_from(file).with_context(|| {
                format!("`{}` is not a compiled program", path.display())
            })?
        }
        None => {
            let pattern = args.get_one::<String>("PATTERN").unwrap();
            rexp::compile(pattern)
                .with_context(|| format!("invalid regexp `{}`", pattern))?
        }
    };

    let prefix = match program.prefix() {
        Some(prefix) => format!("{:?}", prefix.iter().collect::<String>()),
        None => "none".to_string(),
    };

    println!("{} {}", "prefix:".paint(Green), prefix);
    println!("{} {}", "groups:".paint(Green), program.paren_count());
    println!(
        "{} {}",
        "backreferences:".paint(Green),
        if program.has_backrefs() { "yes" } else { "no" }
    );
    print!("{}", program);

    Ok(())
}
