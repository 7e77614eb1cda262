/*! A regular expression compiler and backtracking matcher.

Regular expressions are compiled into a compact [`Program`], a flat buffer
of nodes that is executed by a recursive backtracking [`Matcher`]. Programs
are immutable and can be shared among threads, serialized, and loaded back
later. The [`Regex`] type puts them together with the most common
operations: finding matches, extracting capturing groups, replacing and
splitting.

The supported syntax includes alternatives (`a|b`), greedy and reluctant
closures (`*`, `+`, `?`, `*?`, `+?`, `??`), bounded repetitions (`{m}`,
`{m,}`, `{m,n}`), capturing and non-capturing groups, backreferences
(`\1` to `\9`), character classes (`[a-z]`, `[^0-9]`, `\w`, `\s`, `\d`),
POSIX classes (`[:alpha:]`), anchors (`^`, `$`) and word boundaries
(`\b`, `\B`).

# Example

```rust
# use rexp;
// Compile a regular expression.
let program = rexp::compile(r"(\d+)-(\d+)").unwrap();

// Create a matcher for the program.
let matcher = rexp::Matcher::new(&program);
let mut state = rexp::MatchState::new();

// Look for a match.
let input: Vec<char> = "pages 10-20".chars().collect();

assert!(matcher.find_at(&input, 0, &mut state));
assert_eq!(state.group(0), Some((6, 11)));
assert_eq!(state.group(2), Some((9, 11)));
```
*/

pub use compiler::compile;
pub use compiler::Compiler;

pub use errors::Error;
pub use errors::MatchError;
pub use errors::SerializationError;
pub use errors::SyntaxError;

pub use matcher::Input;
pub use matcher::MatchFlagSet;
pub use matcher::MatchFlags;
pub use matcher::MatchState;
pub use matcher::Matcher;
pub use matcher::ReaderInput;
pub use matcher::StrInput;

pub use program::Program;

pub use regex::glob_to_pattern;
pub use regex::Captures;
pub use regex::MatchResult;
pub use regex::Regex;
pub use regex::ReplaceFlagSet;
pub use regex::ReplaceFlags;

mod compiler;
mod errors;
mod matcher;
mod regex;

pub mod program;

#[cfg(test)]
mod tests;
