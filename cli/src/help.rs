pub const CONFIG_FILE: &str = r#"Config file for rx

Specifies a config file which controls the default behavior of rx. If config file
is not specified, ${HOME}/.rexp.toml is used. If it does not exist the default
options are applied.

Example:

[match]
case_insensitive = true
step_limit = 1000000
depth_limit = 50000"#;

pub const STEP_LIMIT_LONG_HELP: &str = r#"Maximum number of steps for each search

Backtracking can take exponential time with some patterns, like `(a|a)*b`. When a
search takes more steps than this limit it is aborted with an error."#;

pub const DEPTH_LIMIT_LONG_HELP: &str = r#"Maximum recursion depth for each search

Every repetition matched by a loop like `a*` takes one level of recursion, so
very long matches can exhaust the stack. When a search goes deeper than this
limit it is aborted with an error. Use 0 for removing the limit. The default
is 10000."#;

pub const MATCH_LONG_HELP: &str = r#"Print the lines that contain a match

Reads lines from <FILE>, or from the standard input if no file is given, and prints
those that contain some match for <PATTERN>. Matches are highlighted when the
output is a terminal."#;

pub const SUBST_LONG_HELP: &str = r#"Replace the matches of a regular expression

Every match of <PATTERN> in the input is replaced with <REPLACEMENT>. Within the
replacement, $0 stands for the whole match and $1 to $9 for the text captured
by the corresponding group. Use \$ for a literal dollar sign, or --literal for
using the replacement as is.

Examples:

echo 'a=1 b=2' | rx subst '(\w+)=(\w+)' '$2=$1'
echo 'price: 10' | rx subst --literal '\d+' '$$'"#;

pub const SPLIT_LONG_HELP: &str = r#"Split the input around the matches of a regular expression

Prints each piece of the input found between two matches in a separate line. A
trailing line break in the input is ignored."#;

pub const COMPILE_LONG_HELP: &str = r#"Compile a regular expression to binary form

The file produced by this command can be inspected with `rx dump --compiled`."#;

pub const DUMP_LONG_HELP: &str = r#"Show the program produced for a regular expression

Prints the literal prefix, the number of capturing groups, whether there are
backreferences, and the listing of the program's nodes. The program can be
compiled from <PATTERN> or loaded from a file produced by `rx compile`."#;
