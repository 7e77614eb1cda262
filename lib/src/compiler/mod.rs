/*! Compiles regular expressions into [`Program`]s.

The compiler is a recursive descent parser that emits nodes as it goes,
there is no intermediate syntax tree. The grammar is:

```text
  expr     := branch ('|' branch)*
  branch   := closure*
  closure  := terminal ('*' | '+' | '?' | '{m,n}')? '?'?
  terminal := char | '.' | '^' | '$' | class | '(' expr ')' | '(?:' expr ')'
            | escape | backreference
```

Greedy closures don't have opcodes of their own, they are built out of
`BRANCH` and `GOTO` nodes. For instance, `X*` is compiled as a branch that
either matches `X` and jumps back to the branch, or matches nothing. Reluctant
closures, on the other hand, use the `RELUCTANT_*` opcodes, as the matcher
must try the continuation before the closure's body.

Bounded repetitions like `X{2,4}` are compiled by parsing `X` multiple times.
The first time the compiler finds the bracket it records how many mandatory
and optional copies are left, then it goes back to the start of `X` and
parses it again, until every copy has been emitted.
*/

#[cfg(feature = "logging")]
use std::time::Instant;
use std::mem;

#[cfg(feature = "logging")]
use log::*;

use crate::errors::{Error, SyntaxError};
use crate::program::instr::{EscapeClass, Opcode, PosixClass, NODE_SIZE};
use crate::program::Program;

use ranges::RangeSet;
use seq::NodeSeq;

mod ranges;
mod seq;


/// Compiles a regular expression.
///
/// This is a shortcut for `Compiler::new().compile(pattern)`.
pub fn compile(pattern: &str) -> Result<Program, Error> {
    Compiler::new().compile(pattern)
}

/// Result of parsing a backslash escape.
enum Escape {
    /// A character that must be matched literally.
    Char(char),
    /// A class shorthand like `\d`, or a word boundary.
    Class(EscapeClass),
    /// A backreference to some group.
    Backref(u16),
}

/// Kinds of closures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Closure {
    /// `?`
    Maybe,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `{m,n}`
    Bounded,
}

/// Kinds of parenthesis opening an expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Paren {
    None,
    Capture,
    Cluster,
}

/// State of a bounded repetition `{m,n}` while its copies are emitted.
#[derive(Debug)]
struct Bracket {
    /// Index of the opening brace in the pattern.
    start: usize,
    /// Index right after the closing brace, and after the `?` that makes
    /// the repetition reluctant, if any.
    end: usize,
    /// Mandatory copies not emitted yet.
    min: u32,
    /// Optional copies not emitted yet. `None` means unbounded.
    opt: Option<u32>,
    /// True for `{m,n}?`.
    reluctant: bool,
}

/// What to do after emitting one copy of a bounded repetition.
enum Pass {
    /// Emit the terminal as is.
    Mandatory { rewind: bool },
    /// Emit the terminal as `X?`.
    Optional { rewind: bool },
    /// Emit the terminal as `X*`.
    Unbounded,
    /// Drop the terminal, emit `NOTHING` instead.
    Empty,
}

/// Compiles regular expressions.
///
/// A compiler can be used for compiling any number of patterns, one at a
/// time.
pub struct Compiler {
    /// Nodes emitted so far.
    seq: NodeSeq,
    /// The pattern being compiled.
    pattern: Vec<char>,
    /// Index of the next character in `pattern`.
    idx: usize,
    /// Number of capturing groups opened so far, plus one for group 0.
    parens: usize,
    /// Bounded repetitions found so far, identified by the position of
    /// their opening brace.
    brackets: Vec<Bracket>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self {
            seq: NodeSeq::new(),
            pattern: Vec::new(),
            idx: 0,
            parens: 1,
            brackets: Vec::new(),
        }
    }

    /// Compiles `pattern`.
    pub fn compile(&mut self, pattern: &str) -> Result<Program, Error> {
        #[cfg(feature = "logging")]
        let start = Instant::now();

        self.seq = NodeSeq::new();
        self.pattern = pattern.chars().collect();
        self.idx = 0;
        self.parens = 1;
        self.brackets.clear();

        self.expr(true)?;

        match self.peek() {
            None => {}
            Some(')') => {
                return self.syntax_error(SyntaxError::UnmatchedCloseParen)
            }
            Some(_) => return self.syntax_error(SyntaxError::UnexpectedInput),
        }

        let code = mem::take(&mut self.seq).into_inner();

        #[cfg(feature = "logging")]
        debug!(
            "compiled /{}/ into {} words in {:?}",
            pattern,
            code.len(),
            Instant::elapsed(&start)
        );

        Ok(Program::finalize(code, self.parens))
    }
}

impl Compiler {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.pattern.get(self.idx).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.pattern.get(self.idx + offset).copied()
    }

    fn syntax_error<T>(&self, error: SyntaxError) -> Result<T, Error> {
        Err(Error::Syntax { error, position: self.idx })
    }

    /// Parses an expression, which is a list of alternatives optionally
    /// enclosed in parenthesis.
    ///
    /// Returns the address of the expression's first node, and whether the
    /// expression can match the empty string.
    fn expr(&mut self, toplevel: bool) -> Result<(usize, bool), Error> {
        let mut paren = Paren::None;
        let mut open = None;
        let close_parens = self.parens;

        if !toplevel && self.peek() == Some('(') {
            if self.peek_at(1) == Some('?') && self.peek_at(2) == Some(':') {
                self.idx += 3;
                paren = Paren::Cluster;
                open = Some(self.seq.emit(Opcode::OpenCluster, 0)?);
            } else {
                self.idx += 1;
                paren = Paren::Capture;
                open = Some(self.seq.emit(Opcode::Open, self.parens as u32)?);
                self.parens += 1;
            }
        }

        let (branch, mut nullable) = self.branch()?;

        let ret = match open {
            Some(open) => {
                self.seq.set_next_of_end(open, branch)?;
                open
            }
            None => branch,
        };

        while self.peek() == Some('|') {
            self.idx += 1;
            let (branch, branch_nullable) = self.branch()?;
            nullable |= branch_nullable;
            self.seq.set_next_of_end(ret, branch)?;
        }

        let end = match paren {
            Paren::None => self.seq.emit(Opcode::End, 0)?,
            Paren::Capture | Paren::Cluster => {
                if self.peek() != Some(')') {
                    return self.syntax_error(SyntaxError::MissingCloseParen);
                }
                self.idx += 1;
                if paren == Paren::Capture {
                    self.seq.emit(Opcode::Close, close_parens as u32)?
                } else {
                    self.seq.emit(Opcode::CloseCluster, 0)?
                }
            }
        };

        self.seq.set_next_of_end(ret, end)?;

        // The last node of every alternative must be linked to the end.
        let mut node = ret;
        loop {
            if self.seq.opcode(node) == Opcode::Branch as u32 {
                self.seq.set_next_of_end(node + NODE_SIZE, end)?;
            }
            let next = self.seq.next(node);
            if next == 0 {
                break;
            }
            node = (node as isize + next as isize) as usize;
        }

        Ok((ret, nullable))
    }

    /// Parses a sequence of closures, up to the next `|` or `)`.
    ///
    /// The branch is nullable when every closure in it is nullable,
    /// including the case in which there are no closures at all.
    fn branch(&mut self) -> Result<(usize, bool), Error> {
        let ret = self.seq.emit(Opcode::Branch, 0)?;
        let mut chain = None;
        let mut nullable = true;

        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }

            let (node, closure_nullable) = self.closure()?;

            if !closure_nullable {
                nullable = false;
            }

            if let Some(chain) = chain {
                self.seq.set_next_of_end(chain, node)?;
            }

            chain = Some(node);
        }

        if chain.is_none() {
            self.seq.emit(Opcode::Nothing, 0)?;
        }

        Ok((ret, nullable))
    }

    /// Parses a terminal and the closure that follows it, if any.
    fn closure(&mut self) -> Result<(usize, bool), Error> {
        let idx_before_terminal = self.idx;
        let parens_before_terminal = self.parens;

        let (ret, terminal_nullable) = self.terminal()?;

        let mut closure = match self.peek() {
            Some('?') => Closure::Maybe,
            Some('*') => Closure::Star,
            Some('+') => Closure::Plus,
            Some('{') => Closure::Bounded,
            _ => return Ok((ret, terminal_nullable)),
        };

        let opcode = self.seq.opcode(ret);

        if opcode == Opcode::Bol as u32 || opcode == Opcode::Eol as u32 {
            return self.syntax_error(SyntaxError::BadClosureOperand);
        }

        if terminal_nullable {
            return self.syntax_error(SyntaxError::NullableClosureOperand);
        }

        let mut greedy = true;

        if closure == Closure::Bounded {
            let i = match self.brackets.iter().position(|b| b.start == self.idx)
            {
                Some(i) => i,
                None => {
                    let bracket = self.bracket()?;
                    self.brackets.push(bracket);
                    self.brackets.len() - 1
                }
            };

            let bracket = &mut self.brackets[i];
            let (start, end) = (bracket.start, bracket.end);

            greedy = !bracket.reluctant;

            let pass = if bracket.min > 0 {
                bracket.min -= 1;
                Pass::Mandatory {
                    rewind: bracket.min > 0 || bracket.opt != Some(0),
                }
            } else {
                match bracket.opt {
                    None => {
                        bracket.opt = Some(0);
                        Pass::Unbounded
                    }
                    Some(0) => Pass::Empty,
                    Some(n) => {
                        bracket.opt = Some(n - 1);
                        Pass::Optional { rewind: n > 1 }
                    }
                }
            };

            match pass {
                Pass::Mandatory { rewind } => {
                    if rewind {
                        self.rewind(
                            idx_before_terminal,
                            parens_before_terminal,
                            start,
                        );
                    } else {
                        self.idx = end;
                    }
                    return Ok((ret, false));
                }
                Pass::Optional { rewind } => {
                    if rewind {
                        self.rewind(
                            idx_before_terminal,
                            parens_before_terminal,
                            start,
                        );
                    } else {
                        self.idx = end;
                    }
                    closure = Closure::Maybe;
                }
                Pass::Unbounded => {
                    self.idx = end;
                    closure = Closure::Star;
                }
                Pass::Empty => {
                    self.idx = end;
                    self.seq.truncate(ret);
                    return Ok((self.seq.emit(Opcode::Nothing, 0)?, true));
                }
            }
        } else {
            self.idx += 1;
            if self.peek() == Some('?') {
                self.idx += 1;
                greedy = false;
            }
        }

        if !greedy {
            let end = self.seq.emit(Opcode::End, 0)?;
            self.seq.set_next_of_end(ret, end)?;

            let opcode = match closure {
                Closure::Maybe => Opcode::ReluctantMaybe,
                Closure::Star => Opcode::ReluctantStar,
                Closure::Plus => Opcode::ReluctantPlus,
                Closure::Bounded => {
                    return Err(Error::Internal(
                        "bounded closure left unresolved".to_string(),
                    ))
                }
            };

            // RELUCTANT_* (X) END NOTHING, the closure goes on at NOTHING.
            self.seq.insert(opcode, 0, ret)?;
            let nothing = self.seq.emit(Opcode::Nothing, 0)?;
            self.seq.set_next_of_end(ret, nothing)?;

            return Ok((ret, closure != Closure::Plus));
        }

        match closure {
            Closure::Maybe => {
                // BRANCH (X) BRANCH (NOTHING)
                self.seq.insert(Opcode::Branch, 0, ret)?;
                let branch = self.seq.emit(Opcode::Branch, 0)?;
                self.seq.set_next_of_end(ret, branch)?;
                let nothing = self.seq.emit(Opcode::Nothing, 0)?;
                self.seq.set_next_of_end(ret, nothing)?;
                self.seq.set_next_of_end(ret + NODE_SIZE, nothing)?;
            }
            Closure::Star => {
                // BRANCH (X BRANCH (GOTO ret)) BRANCH (NOTHING)
                self.seq.insert(Opcode::Branch, 0, ret)?;
                let branch = self.seq.emit(Opcode::Branch, 0)?;
                self.seq.set_next_of_end(ret + NODE_SIZE, branch)?;
                let goto = self.seq.emit(Opcode::Goto, 0)?;
                self.seq.set_next_of_end(ret + NODE_SIZE, goto)?;
                self.seq.set_next_of_end(ret + NODE_SIZE, ret)?;
                let branch = self.seq.emit(Opcode::Branch, 0)?;
                self.seq.set_next_of_end(ret, branch)?;
                let nothing = self.seq.emit(Opcode::Nothing, 0)?;
                self.seq.set_next_of_end(ret, nothing)?;
            }
            Closure::Plus => {
                // X BRANCH (GOTO ret) BRANCH (NOTHING)
                let branch = self.seq.emit(Opcode::Branch, 0)?;
                self.seq.set_next_of_end(ret, branch)?;
                let goto = self.seq.emit(Opcode::Goto, 0)?;
                self.seq.set_next_of_end(goto, ret)?;
                let second = self.seq.emit(Opcode::Branch, 0)?;
                self.seq.set_next_of_end(branch, second)?;
                let nothing = self.seq.emit(Opcode::Nothing, 0)?;
                self.seq.set_next_of_end(ret, nothing)?;
            }
            Closure::Bounded => {
                return Err(Error::Internal(
                    "bounded closure left unresolved".to_string(),
                ))
            }
        }

        Ok((ret, closure != Closure::Plus))
    }

    /// Goes back to the start of a terminal that must be parsed again for
    /// emitting one more copy of a bounded repetition.
    ///
    /// Repetitions nested inside the terminal are forgotten, so that every
    /// copy of the terminal expands them again. Groups inside the terminal
    /// keep their numbers in every copy.
    fn rewind(&mut self, idx: usize, parens: usize, bracket_start: usize) {
        self.brackets.retain(|b| b.start < idx || b.start >= bracket_start);
        self.idx = idx;
        self.parens = parens;
    }

    /// Parses the `{m}`, `{m,}` or `{m,n}` that starts at the current
    /// position, optionally followed by `?`.
    fn bracket(&mut self) -> Result<Bracket, Error> {
        let start = self.idx;

        if self.peek() != Some('{') {
            return Err(Error::Internal("bracket start not found".to_string()));
        }

        self.idx += 1;

        let min = self.number()?;

        let opt = match self.peek() {
            None => {
                return self.syntax_error(SyntaxError::ExpectedCommaOrBracket)
            }
            Some('}') => {
                self.idx += 1;
                Some(0)
            }
            Some(',') => {
                self.idx += 1;
                match self.peek() {
                    None => {
                        return self
                            .syntax_error(SyntaxError::ExpectedCommaOrBracket)
                    }
                    Some('}') => {
                        self.idx += 1;
                        None
                    }
                    Some(_) => {
                        let max = self.number()?;
                        if max < min {
                            return self.syntax_error(SyntaxError::BadRange);
                        }
                        if self.peek() != Some('}') {
                            return self
                                .syntax_error(SyntaxError::MissingCloseBrace);
                        }
                        self.idx += 1;
                        Some(max - min)
                    }
                }
            }
            Some(_) => return self.syntax_error(SyntaxError::ExpectedComma),
        };

        let reluctant = self.peek() == Some('?');

        if reluctant {
            self.idx += 1;
        }

        Ok(Bracket { start, end: self.idx, min, opt, reluctant })
    }

    /// Parses a decimal number.
    fn number(&mut self) -> Result<u32, Error> {
        let start = self.idx;

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.idx += 1;
        }

        if start == self.idx {
            return self.syntax_error(SyntaxError::ExpectedDigit);
        }

        let digits: String = self.pattern[start..self.idx].iter().collect();

        match digits.parse::<u32>() {
            Ok(n) => Ok(n),
            Err(_) => self.syntax_error(SyntaxError::InvalidNumber),
        }
    }

    /// Parses a terminal.
    fn terminal(&mut self) -> Result<(usize, bool), Error> {
        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Err(Error::Internal(
                    "unexpected end of pattern".to_string(),
                ))
            }
        };

        match c {
            '^' => {
                self.idx += 1;
                Ok((self.seq.emit(Opcode::Bol, 0)?, true))
            }
            '$' => {
                self.idx += 1;
                Ok((self.seq.emit(Opcode::Eol, 0)?, true))
            }
            '.' => {
                self.idx += 1;
                Ok((self.seq.emit(Opcode::Any, 0)?, false))
            }
            '[' => Ok((self.character_class()?, false)),
            '(' => self.expr(false),
            ')' => self.syntax_error(SyntaxError::UnexpectedCloseParen),
            ']' => self.syntax_error(SyntaxError::MismatchedClass),
            '?' | '+' | '{' | '*' => {
                self.syntax_error(SyntaxError::MissingClosureOperand)
            }
            '\\' => {
                let idx_before_escape = self.idx;
                match self.escape()? {
                    Escape::Class(class) => Ok((
                        self.seq.emit(Opcode::Escape, class as u32)?,
                        class.is_boundary(),
                    )),
                    Escape::Backref(n) => {
                        if n as usize >= self.parens {
                            return self
                                .syntax_error(SyntaxError::BadBackreference);
                        }
                        Ok((self.seq.emit(Opcode::Backref, n as u32)?, true))
                    }
                    Escape::Char(_) => {
                        self.idx = idx_before_escape;
                        Ok((self.atom()?, false))
                    }
                }
            }
            _ => Ok((self.atom()?, false)),
        }
    }

    /// Parses the escape sequence that starts at the current position.
    fn escape(&mut self) -> Result<Escape, Error> {
        let escape_char = match self.peek_at(1) {
            Some(c) if self.peek() == Some('\\') => c,
            _ => return self.syntax_error(SyntaxError::EscapeAtEnd),
        };

        self.idx += 2;

        if let Some(class) = EscapeClass::from_char(escape_char) {
            return Ok(Escape::Class(class));
        }

        match escape_char {
            'x' | 'u' => {
                let expected = if escape_char == 'u' { 4 } else { 2 };
                let mut value = 0;

                for _ in 0..expected {
                    match self.peek().and_then(|c| c.to_digit(16)) {
                        Some(digit) => {
                            value = (value << 4) | digit;
                            self.idx += 1;
                        }
                        None => {
                            return self.syntax_error(
                                SyntaxError::BadHexEscape {
                                    escape: escape_char,
                                    expected,
                                },
                            )
                        }
                    }
                }

                match char::from_u32(value) {
                    Some(c) => Ok(Escape::Char(c)),
                    None => self.syntax_error(SyntaxError::BadHexEscape {
                        escape: escape_char,
                        expected,
                    }),
                }
            }
            't' => Ok(Escape::Char('\t')),
            'n' => Ok(Escape::Char('\n')),
            'r' => Ok(Escape::Char('\r')),
            'f' => Ok(Escape::Char('\u{0C}')),
            '0'..='9' => {
                let next_is_digit =
                    matches!(self.peek(), Some(c) if c.is_ascii_digit());

                if !next_is_digit && escape_char != '0' {
                    return Ok(Escape::Backref(escape_char as u16 - '0' as u16));
                }

                // Octal escape, up to three digits.
                let mut value = escape_char as u32 - '0' as u32;

                for _ in 0..2 {
                    match self.peek() {
                        Some(c) if c.is_ascii_digit() => {
                            value = (value << 3) + (c as u32 - '0' as u32);
                            self.idx += 1;
                        }
                        _ => break,
                    }
                }

                char::from_u32(value).map(Escape::Char).ok_or_else(|| {
                    Error::Internal(format!("invalid octal escape {}", value))
                })
            }
            c => Ok(Escape::Char(c)),
        }
    }

    /// Parses a run of literal characters and emits them as a single
    /// `ATOM` node.
    fn atom(&mut self) -> Result<usize, Error> {
        let ret = self.seq.emit(Opcode::Atom, 0)?;
        let mut len = 0;

        while let Some(c) = self.peek() {
            if len == crate::program::instr::MAX_OPDATA as usize {
                break;
            }

            // A closure applies to the last character only, so that
            // character goes to an atom of its own.
            if len > 0 {
                let next = if c == '\\' {
                    let idx_escape = self.idx;
                    self.escape()?;
                    let next = self.peek();
                    self.idx = idx_escape;
                    next
                } else {
                    self.peek_at(1)
                };

                if matches!(next, Some('{' | '?' | '*' | '+')) {
                    break;
                }
            }

            match c {
                ']' | '^' | '$' | '.' | '[' | '(' | ')' | '|' => break,
                '{' | '?' | '*' | '+' => {
                    if len == 0 {
                        return self
                            .syntax_error(SyntaxError::MissingClosureOperand);
                    }
                    break;
                }
                '\\' => {
                    let idx_before_escape = self.idx;
                    match self.escape()? {
                        Escape::Char(c) => {
                            self.seq.emit_word(c as u32)?;
                            len += 1;
                        }
                        _ => {
                            self.idx = idx_before_escape;
                            break;
                        }
                    }
                }
                c => {
                    self.seq.emit_word(c as u32)?;
                    self.idx += 1;
                    len += 1;
                }
            }
        }

        if len == 0 {
            return Err(Error::Internal("empty atom".to_string()));
        }

        self.seq.set_opdata(ret, len)?;

        Ok(ret)
    }

    /// Parses a character class, either a POSIX class like `[:alpha:]` or
    /// a set of characters like `[a-z_]`.
    fn character_class(&mut self) -> Result<usize, Error> {
        if self.peek() != Some('[') {
            return Err(Error::Internal("class start not found".to_string()));
        }

        self.idx += 1;

        if matches!(self.peek(), None | Some(']')) {
            return self.syntax_error(SyntaxError::UnterminatedClass);
        }

        if self.peek() == Some(':') {
            self.idx += 1;
            let name_start = self.idx;

            while matches!(self.peek(), Some('a'..='z')) {
                self.idx += 1;
            }

            if self.peek() == Some(':') && self.peek_at(1) == Some(']') {
                let name: String =
                    self.pattern[name_start..self.idx].iter().collect();

                return match PosixClass::from_name(&name) {
                    Some(class) => {
                        self.idx += 2;
                        self.seq.emit(Opcode::PosixClass, class as u32)
                    }
                    None => {
                        self.syntax_error(SyntaxError::InvalidPosixClass(name))
                    }
                };
            }

            return self.syntax_error(SyntaxError::InvalidPosixSyntax);
        }

        let first = self.idx;
        let mut set = RangeSet::new();
        let mut include = true;
        let mut defining_range = false;
        let mut range_start = 0;
        let mut simple_char: Option<char> = None;

        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }

            match c {
                '^' if self.idx == first => {
                    include = false;
                    set = RangeSet::universal();
                    self.idx += 1;
                    continue;
                }
                '\\' => match self.escape()? {
                    Escape::Class(class) => {
                        if defining_range {
                            return self.syntax_error(SyntaxError::BadClass);
                        }
                        match class {
                            EscapeClass::Space => {
                                for c in ['\t', '\r', '\u{0C}', '\n', '\u{08}', ' ']
                                {
                                    set.include(c as u32, c as u32, include);
                                }
                            }
                            EscapeClass::Word => {
                                set.include('a' as u32, 'z' as u32, include);
                                set.include('A' as u32, 'Z' as u32, include);
                                set.include('_' as u32, '_' as u32, include);
                                set.include('0' as u32, '9' as u32, include);
                            }
                            EscapeClass::Digit => {
                                set.include('0' as u32, '9' as u32, include);
                            }
                            _ => {
                                return self.syntax_error(SyntaxError::BadClass)
                            }
                        }
                        continue;
                    }
                    Escape::Backref(_) => {
                        return self.syntax_error(SyntaxError::BadClass)
                    }
                    Escape::Char(c) => simple_char = Some(c),
                },
                '-' => {
                    if defining_range {
                        return self.syntax_error(SyntaxError::BadClassRange);
                    }
                    defining_range = true;
                    range_start = simple_char.map_or(0, |c| c as u32);
                    self.idx += 1;
                    if self.peek() == Some(']') {
                        simple_char = Some(char::MAX);
                    } else {
                        continue;
                    }
                }
                c => {
                    simple_char = Some(c);
                    self.idx += 1;
                }
            }

            let c = simple_char.map_or(0, |c| c as u32);

            if defining_range {
                if range_start >= c {
                    return self.syntax_error(SyntaxError::BadClass);
                }
                set.include(range_start, c, include);
                defining_range = false;
            } else if self.peek() != Some('-') {
                set.include(c, c, include);
            }
        }

        if self.peek().is_none() {
            return self.syntax_error(SyntaxError::UnterminatedClass);
        }

        self.idx += 1;

        let ret = self.seq.emit(Opcode::AnyOf, 0)?;

        for (min, max) in set.ranges() {
            self.seq.emit_word(*min)?;
            self.seq.emit_word(*max)?;
        }

        self.seq.set_opdata(ret, set.len())?;

        Ok(ret)
    }
}
