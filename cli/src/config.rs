use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use rexp::{MatchFlagSet, MatchFlags};
use serde::{Deserialize, Serialize};

/// Configuration for the CLI.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Configuration shared by the commands that match regexps.
    #[serde(rename = "match")]
    pub matching: MatchConfig,
}

/// Default for [`MatchConfig::depth_limit`].
pub const DEFAULT_DEPTH_LIMIT: usize = 10_000;

/// Configuration for the `match`, `subst` and `split` commands.
#[derive(Deserialize, Serialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Letters match regardless of their case.
    #[serde(default)]
    pub case_insensitive: bool,
    /// `^` and `$` match at the start and end of every line.
    #[serde(default)]
    pub multiline: bool,
    /// `.` matches line terminators.
    #[serde(default)]
    pub single_line: bool,
    /// Maximum number of steps for each search, unlimited if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_limit: Option<u64>,
    /// Maximum recursion depth for each search, 0 means unlimited.
    #[serde(default = "default_depth_limit")]
    pub depth_limit: usize,
}

fn default_depth_limit() -> usize {
    DEFAULT_DEPTH_LIMIT
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multiline: false,
            single_line: false,
            step_limit: None,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl MatchConfig {
    /// Returns the match flags enabled in the config file.
    pub fn flags(&self) -> MatchFlagSet {
        let mut flags = MatchFlagSet::none();
        if self.case_insensitive {
            flags.set(MatchFlags::CaseInsensitive);
        }
        if self.multiline {
            flags.set(MatchFlags::Multiline);
        }
        if self.single_line {
            flags.set(MatchFlags::SingleLine);
        }
        flags
    }
}

/// Load a config file from a given path. Path must contain a valid TOML file
/// or this function will propagate the error.
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, Box<figment::Error>> {
    let config: Config =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(config_file))
            .extract()?;
    Ok(config)
}
