mod commands;
mod config;
mod help;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::{io, panic, process, thread};

use anyhow::Context;
use clap::ArgMatches;
use config::{load_config_from_file, Config};
use crossterm::tty::IsTty;
use yansi::Color::Red;
use yansi::Paint;

use crate::commands::cli;

const APP_HELP_TEMPLATE: &str = r#"rx {version}, regular expressions from the command line.

{author-with-newline}
{before-help}{usage-heading}
  {usage}

{all-args}{after-help}
"#;

const EXIT_ERROR: i32 = 1;
const CONFIG_FILE: &str = ".rexp.toml";

/// Stack size of the thread that runs the command. The recursion of each
/// search is bounded by the depth limit, the default one fits comfortably.
const STACK_SIZE: usize = 256 * 1024 * 1024;

fn main() -> anyhow::Result<()> {
    // Enable support for ANSI escape codes in Windows. In other platforms
    // this is a no-op.
    if let Err(err) = enable_ansi_support::enable_ansi_support() {
        println!("could not enable ANSI support: {}", err)
    }

    #[cfg(feature = "logging")]
    env_logger::init();

    // If stdout is not a tty (for example, because it was redirected to a
    // file) turn off colors. This way you can redirect the output to a file
    // without ANSI escape codes messing up the file content.
    if !io::stdout().is_tty() {
        yansi::disable();
    }

    let args = cli().get_matches_from(wild::args());

    // A panic while matching means that the program is corrupt, exit with
    // an error instead of unwinding.
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(EXIT_ERROR);
    }));

    let result = load_config(&args).and_then(|config| {
        thread::scope(|s| {
            thread::Builder::new()
                .stack_size(STACK_SIZE)
                .spawn_scoped(s, || exec_command(&args, &config))
                .context("can not start the command")?
                .join()
                .unwrap_or_else(|_| process::exit(EXIT_ERROR))
        })
    });

    if let Err(err) = result {
        if let Some(source) = err.source() {
            eprintln!("{} {}: {}", "error:".paint(Red).bold(), err, source);
        } else {
            eprintln!("{} {}", "error:".paint(Red).bold(), err);
        }
        process::exit(EXIT_ERROR);
    }

    Ok(())
}

fn exec_command(args: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    match args.subcommand() {
        Some(("match", args)) => commands::exec_match(args, config),
        Some(("subst", args)) => commands::exec_subst(args, config),
        Some(("split", args)) => commands::exec_split(args, config),
        Some(("compile", args)) => commands::exec_compile(args),
        Some(("dump", args)) => commands::exec_dump(args),
        _ => unreachable!(),
    }
}

/// Loads the config file passed with `--config`, or `$HOME/.rexp.toml` if
/// it exists. Options given in the command line take precedence over the
/// ones in the file.
fn load_config(args: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => load_config_from_file(path).with_context(|| {
            format!("can not load config file `{}`", path.display())
        })?,
        None => match home::home_dir() {
            Some(home_path) if !home_path.as_os_str().is_empty() => {
                load_config_from_file(&home_path.join(CONFIG_FILE))
                    .unwrap_or_default()
            }
            _ => Config::default(),
        },
    };

    if let Some(limit) = args.get_one::<u64>("step-limit") {
        config.matching.step_limit = Some(*limit);
    }

    if let Some(limit) = args.get_one::<usize>("depth-limit") {
        config.matching.depth_limit = *limit;
    }

    Ok(config)
}
