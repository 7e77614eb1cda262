use std::io;

use thiserror::Error;

/// Errors returned while compiling a regular expression.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The pattern is not a valid regular expression. `position` is the
    /// index, in characters, where the problem was detected.
    #[error("syntax error at position {position}: {error}")]
    Syntax {
        /// What went wrong.
        error: SyntaxError,
        /// Index of the character where the error was detected.
        position: usize,
    },

    /// The compiled regexp doesn't fit in the program encoding, for
    /// instance because some literal or class is too long.
    #[error("regexp too large")]
    TooLarge,

    /// The compiler reached an inconsistent state. This is a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the [`SyntaxError`] if this is a syntax error.
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Kinds of syntax errors found in patterns.
#[allow(missing_docs)]
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected close paren")]
    UnexpectedCloseParen,

    #[error("unmatched close paren")]
    UnmatchedCloseParen,

    #[error("missing close paren")]
    MissingCloseParen,

    #[error("mismatched class")]
    MismatchedClass,

    #[error("missing operand to closure")]
    MissingClosureOperand,

    #[error("bad closure operand")]
    BadClosureOperand,

    #[error("closure operand can't be nullable")]
    NullableClosureOperand,

    #[error("escape terminates string")]
    EscapeAtEnd,

    #[error("expected {expected} hexadecimal digits after \\{escape}")]
    BadHexEscape { escape: char, expected: usize },

    #[error("bad backreference")]
    BadBackreference,

    #[error("empty or unterminated class")]
    UnterminatedClass,

    #[error("bad character class")]
    BadClass,

    #[error("bad class range")]
    BadClassRange,

    #[error("invalid POSIX character class '{0}'")]
    InvalidPosixClass(String),

    #[error("invalid POSIX character class syntax")]
    InvalidPosixSyntax,

    #[error("expected digit")]
    ExpectedDigit,

    #[error("expected comma")]
    ExpectedComma,

    #[error("expected comma or right bracket")]
    ExpectedCommaOrBracket,

    #[error("expected valid number")]
    InvalidNumber,

    #[error("bad range")]
    BadRange,

    #[error("missing close brace")]
    MissingCloseBrace,

    #[error("unexpected input remains")]
    UnexpectedInput,
}

/// Errors returned while serializing or deserializing a [`crate::Program`].
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The data is not a serialized program, or the program is corrupt.
    #[error("not a valid compiled regexp")]
    InvalidFormat,

    /// The data could not be decoded.
    #[error("invalid compiled regexp encoding")]
    InvalidEncoding(#[from] bincode::Error),

    /// I/O error while reading or writing.
    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// Errors returned by the fallible searches of [`crate::Regex`].
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum MatchError {
    /// The search took more steps, or recursed deeper, than allowed by the
    /// limits set with [`crate::Regex::step_limit`] and
    /// [`crate::Regex::depth_limit`].
    #[error("search aborted, step or depth limit exceeded")]
    LimitExceeded,
}
