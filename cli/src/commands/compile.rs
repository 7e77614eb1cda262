use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};

use crate::help;

pub fn compile() -> Command {
    super::command("compile")
        .about("Compile a regular expression to binary form")
        .long_about(help::COMPILE_LONG_HELP)
        .arg(arg!(<PATTERN>).help("Regular expression"))
        .arg(
            arg!(-o --"output" <OUTPUT_PATH>)
                .help("Output file with the compiled program")
                .default_value("output.rxc")
                .value_parser(value_parser!(PathBuf)),
        )
}

pub fn exec_compile(args: &ArgMatches) -> anyhow::Result<()> {
    let pattern = args.get_one::<String>("PATTERN").unwrap();
    let output_path = args.get_one::<PathBuf>("output").unwrap();

    let program = rexp::compile(pattern)
        .with_context(|| format!("invalid regexp `{}`", pattern))?;

    let output_file = File::create(output_path).with_context(|| {
        format!("can not write `{}`", output_path.display())
    })?;

    Ok(program.serialize_into(&output_file)?)
}
