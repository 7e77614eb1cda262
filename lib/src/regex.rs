/*! High-level API built on top of the compiler and the matcher.

A [`Regex`] owns a compiled [`Program`] together with the flags and limits
used for matching it, and offers the operations that most users need:
checking whether a string matches, extracting capturing groups, replacing
and splitting.

```
use rexp::Regex;

let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
let caps = re.captures("mail bob@example.com now").unwrap();

assert_eq!(caps.get(1), Some("bob"));
assert_eq!(caps.get(2), Some("example"));
```
*/

use std::sync::{Arc, Mutex};

use bitmask::bitmask;

use crate::compiler::compile;
use crate::errors::{Error, MatchError};
use crate::matcher::{Input, MatchFlagSet, MatchState, Matcher, StrInput};
use crate::program::Program;

bitmask! {
    /// Flags that control [`Regex::subst`].
    ///
    /// * `FirstOnly`: replace only the first match.
    /// * `Backreferences`: expand `$0` to `$9` in the replacement with the
    ///   text of the corresponding group, `\$` is a literal `$`.
    #[derive(Debug)]
    pub mask ReplaceFlagSet: u8 where flags ReplaceFlags {
        FirstOnly      = 0x01,
        Backreferences = 0x02,
    }
}

/// A compiled regular expression ready to be matched.
///
/// Cloning a `Regex` is cheap, clones share the same [`Program`].
#[derive(Debug)]
pub struct Regex {
    program: Arc<Program>,
    flags: MatchFlagSet,
    step_limit: Option<u64>,
    depth_limit: Option<usize>,
    /// State reused among matches, so that the group arrays are not
    /// allocated every time.
    state: Mutex<Option<MatchState>>,
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Self {
            program: self.program.clone(),
            flags: self.flags,
            step_limit: self.step_limit,
            depth_limit: self.depth_limit,
            state: Mutex::new(None),
        }
    }
}

impl Regex {
    /// Compiles `pattern` with no flags.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_flags(pattern, MatchFlagSet::none())
    }

    /// Compiles `pattern` and matches it with the given flags.
    pub fn with_flags(
        pattern: &str,
        flags: MatchFlagSet,
    ) -> Result<Self, Error> {
        Ok(Self::from_program(compile(pattern)?, flags))
    }

    /// Creates a regexp from an already compiled program, for instance one
    /// obtained with [`Program::deserialize`].
    pub fn from_program(program: Program, flags: MatchFlagSet) -> Self {
        Self {
            program: Arc::new(program),
            flags,
            step_limit: None,
            depth_limit: None,
            state: Mutex::new(None),
        }
    }

    /// The compiled program.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    #[inline]
    pub fn flags(&self) -> MatchFlagSet {
        self.flags
    }

    pub fn set_flags(&mut self, flags: MatchFlagSet) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Limits the number of steps of every search. See
    /// [`Matcher::step_limit`].
    pub fn step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Limits the recursion depth of every search. See
    /// [`Matcher::depth_limit`].
    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Returns true if there's a match anywhere in `s`.
    ///
    /// A search aborted by the step or depth limit returns false, use
    /// [`Regex::try_is_match`] for telling both cases apart.
    pub fn is_match(&self, s: &str) -> bool {
        self.is_match_at(s, 0)
    }

    /// Returns true if there's a match that starts at character index
    /// `start` or after it.
    pub fn is_match_at(&self, s: &str, start: usize) -> bool {
        self.try_is_match_at(s, start).unwrap_or(false)
    }

    /// Like [`Regex::is_match`], but returns an error if the search was
    /// aborted by the step or depth limit.
    pub fn try_is_match(&self, s: &str) -> Result<bool, MatchError> {
        self.try_is_match_at(s, 0)
    }

    /// Like [`Regex::is_match_at`], but returns an error if the search was
    /// aborted by the step or depth limit.
    pub fn try_is_match_at(
        &self,
        s: &str,
        start: usize,
    ) -> Result<bool, MatchError> {
        let chars: Vec<char> = s.chars().collect();
        let matcher = self.matcher(false);
        self.with_state(|state| search(&matcher, &chars, start, state))
    }

    /// Returns the groups of the first match in `s`.
    pub fn captures<'h>(&self, s: &'h str) -> Option<Captures<'h>> {
        self.captures_at(s, 0)
    }

    /// Returns the groups of the first match that starts at character index
    /// `start` or after it.
    pub fn captures_at<'h>(
        &self,
        s: &'h str,
        start: usize,
    ) -> Option<Captures<'h>> {
        self.try_captures_at(s, start).ok().flatten()
    }

    /// Like [`Regex::captures`], but returns an error if the search was
    /// aborted by the step or depth limit.
    pub fn try_captures<'h>(
        &self,
        s: &'h str,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        self.try_captures_at(s, 0)
    }

    /// Like [`Regex::captures_at`], but returns an error if the search was
    /// aborted by the step or depth limit.
    pub fn try_captures_at<'h>(
        &self,
        s: &'h str,
        start: usize,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        let input = StrInput::new(s);

        let Some(result) = self.try_find_in(&input, start)? else {
            return Ok(None);
        };

        let byte_spans = result
            .groups
            .iter()
            .map(|span| {
                span.map(|(start, end)| {
                    (input.byte_offset(start), input.byte_offset(end))
                })
            })
            .collect();

        Ok(Some(Captures { haystack: s, result, byte_spans }))
    }

    /// Looks for a match in any kind of input, starting at index `start`.
    pub fn find_in<I: Input + ?Sized>(
        &self,
        input: &I,
        start: usize,
    ) -> Option<MatchResult> {
        self.try_find_in(input, start).ok().flatten()
    }

    /// Like [`Regex::find_in`], but returns an error if the search was
    /// aborted by the step or depth limit.
    pub fn try_find_in<I: Input + ?Sized>(
        &self,
        input: &I,
        start: usize,
    ) -> Result<Option<MatchResult>, MatchError> {
        let matcher = self.matcher(true);
        self.with_state(|state| {
            Ok(search(&matcher, input, start, state)?.then(|| MatchResult {
                groups: (0..state.group_count())
                    .map(|i| state.group(i))
                    .collect(),
            }))
        })
    }

    /// Replaces the matches in `s` with `replacement`.
    ///
    /// Matches are searched from left to right, each one starting where
    /// the previous one ended. An empty match is replaced and the character
    /// that follows it is copied to the output, so that the search always
    /// makes progress. The end of the input is a valid place for a match.
    ///
    /// If a search is aborted by the step or depth limit, the rest of the
    /// input is copied as is. [`Regex::try_subst`] returns an error instead.
    ///
    /// ```
    /// use rexp::{Regex, ReplaceFlagSet, ReplaceFlags};
    ///
    /// let re = Regex::new("a*").unwrap();
    /// assert_eq!(re.subst("bb", "X", ReplaceFlagSet::none()), "XbXbX");
    ///
    /// let re = Regex::new(r"(\w+)=(\w+)").unwrap();
    /// assert_eq!(
    ///     re.subst("a=1 b=2", "$2=$1", ReplaceFlags::Backreferences.into()),
    ///     "1=a 2=b"
    /// );
    /// ```
    pub fn subst(
        &self,
        s: &str,
        replacement: &str,
        flags: ReplaceFlagSet,
    ) -> String {
        self.replace(s, replacement, flags).0
    }

    /// Like [`Regex::subst`], but returns an error if some search was
    /// aborted by the step or depth limit.
    pub fn try_subst(
        &self,
        s: &str,
        replacement: &str,
        flags: ReplaceFlagSet,
    ) -> Result<String, MatchError> {
        match self.replace(s, replacement, flags) {
            (out, None) => Ok(out),
            (_, Some(err)) => Err(err),
        }
    }

    /// Splits `s` in the pieces found between matches.
    ///
    /// A match at the start of `s` produces an empty first piece. An empty
    /// match right where the previous piece ended produces a piece with
    /// the single character that follows it. If a search is aborted by the
    /// step or depth limit the rest of the input is the last piece.
    ///
    /// ```
    /// use rexp::Regex;
    ///
    /// let re = Regex::new("[ab]+").unwrap();
    /// assert_eq!(re.split("ab12ba34"), vec!["", "12", "34"]);
    /// ```
    pub fn split<'h>(&self, s: &'h str) -> Vec<&'h str> {
        self.split_pieces(s).0
    }

    /// Like [`Regex::split`], but returns an error if some search was
    /// aborted by the step or depth limit.
    pub fn try_split<'h>(
        &self,
        s: &'h str,
    ) -> Result<Vec<&'h str>, MatchError> {
        match self.split_pieces(s) {
            (pieces, None) => Ok(pieces),
            (_, Some(err)) => Err(err),
        }
    }

    /// Returns the items that contain a match.
    pub fn grep<'a, I>(&self, items: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        items.into_iter().filter(|item| self.is_match(item)).collect()
    }

    fn replace(
        &self,
        s: &str,
        replacement: &str,
        flags: ReplaceFlagSet,
    ) -> (String, Option<MatchError>) {
        let backrefs = flags.contains(ReplaceFlags::Backreferences);
        let first_only = flags.contains(ReplaceFlags::FirstOnly);

        let input = StrInput::new(s);
        let len = input.len();
        let matcher = self.matcher(backrefs);

        let mut out = String::with_capacity(s.len());
        let mut pos = 0;
        let mut aborted = None;

        self.with_state(|state| {
            while pos <= len {
                match search(&matcher, &input, pos, state) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => {
                        aborted = Some(err);
                        break;
                    }
                }

                let (start, end) = match state.group(0) {
                    Some(span) => span,
                    None => break,
                };

                out.push_str(input.slice(pos, start));

                if backrefs {
                    expand_replacement(replacement, &input, state, &mut out);
                } else {
                    out.push_str(replacement);
                }

                if start == end {
                    if start < len {
                        out.push_str(input.slice(start, start + 1));
                    }
                    pos = start + 1;
                } else {
                    pos = end;
                }

                if first_only {
                    break;
                }
            }
        });

        if pos < len {
            out.push_str(input.slice(pos, len));
        }

        (out, aborted)
    }

    fn split_pieces<'h>(
        &self,
        s: &'h str,
    ) -> (Vec<&'h str>, Option<MatchError>) {
        let input = StrInput::new(s);
        let len = input.len();
        let matcher = self.matcher(false);

        let mut pieces = Vec::new();
        let mut pos = 0;
        let mut aborted = None;

        self.with_state(|state| {
            while pos < len {
                match search(&matcher, &input, pos, state) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => {
                        aborted = Some(err);
                        break;
                    }
                }

                let (start, end) = match state.group(0) {
                    Some(span) => span,
                    None => break,
                };

                if end == pos {
                    pieces.push(input.slice(pos, start + 1));
                    pos += 1;
                } else {
                    pieces.push(input.slice(pos, start));
                    pos = end;
                }
            }
        });

        if pos < len {
            pieces.push(input.slice(pos, len));
        }

        (pieces, aborted)
    }

    fn matcher(&self, record_groups: bool) -> Matcher<'_> {
        let mut matcher = Matcher::new(&self.program)
            .flags(self.flags)
            .record_groups(record_groups);

        if let Some(limit) = self.step_limit {
            matcher = matcher.step_limit(limit);
        }

        if let Some(limit) = self.depth_limit {
            matcher = matcher.depth_limit(limit);
        }

        matcher
    }

    /// Calls `f` with the pooled match state. If the state is in use by
    /// another thread `f` receives a new one.
    fn with_state<T>(&self, f: impl FnOnce(&mut MatchState) -> T) -> T {
        match self.state.try_lock() {
            Ok(mut slot) => f(slot.get_or_insert_with(MatchState::new)),
            Err(_) => f(&mut MatchState::new()),
        }
    }
}

/// Runs `matcher` over `input`, turning a search aborted by some limit into
/// an error.
fn search<I: Input + ?Sized>(
    matcher: &Matcher,
    input: &I,
    start: usize,
    state: &mut MatchState,
) -> Result<bool, MatchError> {
    let found = matcher.find_at(input, start, state);
    if state.limit_exceeded() {
        Err(MatchError::LimitExceeded)
    } else {
        Ok(found)
    }
}

/// Appends `replacement` to `out`, replacing `$0` to `$9` with the text of
/// the corresponding group. Groups that didn't participate in the match
/// expand to nothing.
fn expand_replacement(
    replacement: &str,
    input: &StrInput,
    state: &MatchState,
    out: &mut String,
) {
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                out.push('$');
            }
            '$' => match chars.peek().and_then(|d| d.to_digit(10)) {
                Some(n) => {
                    chars.next();
                    if let Some((start, end)) = state.group(n as usize) {
                        out.push_str(input.slice(start, end));
                    }
                }
                None => out.push('$'),
            },
            c => out.push(c),
        }
    }
}

/// Spans of the groups found by [`Regex::find_in`], as character indexes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MatchResult {
    groups: Vec<Option<(usize, usize)>>,
}

impl MatchResult {
    /// Number of groups, including group 0.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Span of group `i`, `None` if the group didn't participate in the
    /// match or doesn't exist.
    #[inline]
    pub fn group(&self, i: usize) -> Option<(usize, usize)> {
        self.groups.get(i).copied().flatten()
    }

    /// Index where the match starts.
    pub fn start(&self) -> usize {
        self.group(0).map_or(0, |(start, _)| start)
    }

    /// Index where the match ends.
    pub fn end(&self) -> usize {
        self.group(0).map_or(0, |(_, end)| end)
    }
}

/// The groups of a match found in a string.
#[derive(Debug, Clone)]
pub struct Captures<'h> {
    haystack: &'h str,
    result: MatchResult,
    byte_spans: Vec<Option<(usize, usize)>>,
}

impl<'h> Captures<'h> {
    /// Number of groups, including group 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.result.group_count()
    }

    /// Always false, group 0 is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Span of group `i` in characters.
    #[inline]
    pub fn span(&self, i: usize) -> Option<(usize, usize)> {
        self.result.group(i)
    }

    /// Span of group `i` in bytes.
    #[inline]
    pub fn byte_span(&self, i: usize) -> Option<(usize, usize)> {
        self.byte_spans.get(i).copied().flatten()
    }

    /// Text matched by group `i`.
    pub fn get(&self, i: usize) -> Option<&'h str> {
        self.byte_span(i).map(|(start, end)| &self.haystack[start..end])
    }

    /// The whole match.
    pub fn as_str(&self) -> &'h str {
        self.get(0).unwrap_or_default()
    }
}

/// Converts a glob-like pattern, where `*` matches any sequence of
/// characters, into an equivalent regular expression. Every other
/// character matches itself.
///
/// ```
/// use rexp::{glob_to_pattern, Regex};
///
/// assert_eq!(glob_to_pattern("*.rs"), r".*\.rs");
///
/// let re = Regex::new(&glob_to_pattern("main*(1)")).unwrap();
/// assert!(re.is_match("main_v2(1)"));
/// ```
pub fn glob_to_pattern(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() * 2);

    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '.' | '[' | ']' | '\\' | '+' | '?' | '{' | '}' | '$' | '^'
            | '|' | '(' | ')' => {
                pattern.push('\\');
                pattern.push(c);
            }
            c => pattern.push(c),
        }
    }

    pattern
}
