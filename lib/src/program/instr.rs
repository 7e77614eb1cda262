/*!
This module defines the node layout used by compiled programs, along with
the types that decode a sequence of words back into instructions.

Node encoding format
--------------------

A program is a flat sequence of 32-bit words. Every node starts with a
header of three words: the opcode, a 16-bit payload called `opdata`, and
the offset of the next node in the control-flow chain.

```text
  +--------+--------+--------+
  | opcode | opdata |  next  |
  +--------+--------+--------+
```

The `next` offset is relative to the first word of the node, and it can be
negative, as loops jump backwards. An offset of zero means that the node has
no successor yet. This happens only while the compiler is still building the
program, by the time a program is finalized every chain ends at an `END`
node, or at the `END` node closing the body of a reluctant closure.

Two opcodes are followed by inline data that is not part of the header:

```text
  ATOM    | opdata = N | next | c1 | c2 | ... | cN |
  ANYOF   | opdata = N | next | min1 | max1 | ... | minN | maxN |
```

`ATOM` carries a run of `N` literal code points, and `ANYOF` carries `N`
inclusive code point ranges. Anyone walking the program linearly must skip
this data instead of interpreting it as opcodes, which is what
[`NodeParser`] does.

For instance, the regexp `/ab|c/` is encoded as:

```text
  00000: BRANCH -> 00008
  00003: ATOM "ab" -> 00015
  00008: BRANCH -> 00015
  00011: ATOM "c" -> 00015
  00015: END
```
 */

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Number of words in a node header.
pub const NODE_SIZE: usize = 3;

/// Position of the opcode within the node header.
pub const OFFSET_OPCODE: usize = 0;

/// Position of the opcode's payload within the node header.
pub const OFFSET_OPDATA: usize = 1;

/// Position of the offset to the next node within the node header.
pub const OFFSET_NEXT: usize = 2;

/// Maximum value that fits in the `opdata` word of a node.
pub const MAX_OPDATA: u32 = u16::MAX as u32;

/// Offset for the `next` word of a node. The offset is always relative to
/// the address where the node starts.
pub type Offset = i32;

/// Opcodes that can appear in the header of a node.
///
/// `STAR`, `PLUS` and `MAYBE` are part of the instruction set, but the
/// compiler never emits them: greedy closures are expressed with `BRANCH`
/// and `GOTO` nodes instead.
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum Opcode {
    End = 0x00,
    Bol = 0x01,
    Eol = 0x02,
    Any = 0x03,
    AnyOf = 0x04,
    Branch = 0x05,
    Atom = 0x06,
    Star = 0x07,
    Plus = 0x08,
    Maybe = 0x09,
    Escape = 0x0A,
    Open = 0x0B,
    Close = 0x0C,
    OpenCluster = 0x0D,
    CloseCluster = 0x0E,
    Backref = 0x0F,
    Goto = 0x10,
    Nothing = 0x11,
    ReluctantStar = 0x12,
    ReluctantPlus = 0x13,
    ReluctantMaybe = 0x14,
    PosixClass = 0x15,
}

impl Opcode {
    /// Name used for the opcode in program listings.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::End => "END",
            Opcode::Bol => "BOL",
            Opcode::Eol => "EOL",
            Opcode::Any => "ANY",
            Opcode::AnyOf => "ANYOF",
            Opcode::Branch => "BRANCH",
            Opcode::Atom => "ATOM",
            Opcode::Star => "STAR",
            Opcode::Plus => "PLUS",
            Opcode::Maybe => "MAYBE",
            Opcode::Escape => "ESCAPE",
            Opcode::Open => "OPEN",
            Opcode::Close => "CLOSE",
            Opcode::OpenCluster => "OPEN_CLUSTER",
            Opcode::CloseCluster => "CLOSE_CLUSTER",
            Opcode::Backref => "BACKREF",
            Opcode::Goto => "GOTO",
            Opcode::Nothing => "NOTHING",
            Opcode::ReluctantStar => "RELUCTANT_STAR",
            Opcode::ReluctantPlus => "RELUCTANT_PLUS",
            Opcode::ReluctantMaybe => "RELUCTANT_MAYBE",
            Opcode::PosixClass => "POSIXCLASS",
        }
    }
}

/// Class shorthands that can follow a backslash, like `\w` or `\b`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum EscapeClass {
    /// `\w`
    Word = 0x00,
    /// `\W`
    NonWord = 0x01,
    /// `\s`
    Space = 0x02,
    /// `\S`
    NonSpace = 0x03,
    /// `\d`
    Digit = 0x04,
    /// `\D`
    NonDigit = 0x05,
    /// `\b`
    Boundary = 0x06,
    /// `\B`
    NonBoundary = 0x07,
}

impl EscapeClass {
    /// Returns the class that corresponds to the character that follows
    /// the backslash, if any.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(Self::Word),
            'W' => Some(Self::NonWord),
            's' => Some(Self::Space),
            'S' => Some(Self::NonSpace),
            'd' => Some(Self::Digit),
            'D' => Some(Self::NonDigit),
            'b' => Some(Self::Boundary),
            'B' => Some(Self::NonBoundary),
            _ => None,
        }
    }

    /// The character that follows the backslash for this class.
    pub fn as_char(&self) -> char {
        match self {
            Self::Word => 'w',
            Self::NonWord => 'W',
            Self::Space => 's',
            Self::NonSpace => 'S',
            Self::Digit => 'd',
            Self::NonDigit => 'D',
            Self::Boundary => 'b',
            Self::NonBoundary => 'B',
        }
    }

    /// True for `\b` and `\B`, which are zero-length assertions instead of
    /// classes that consume one character.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Boundary | Self::NonBoundary)
    }

    /// Returns true if `c` belongs to the class.
    ///
    /// # Panics
    ///
    /// If called for `\b` or `\B`.
    pub fn matches(&self, c: char) -> bool {
        match self {
            Self::Word => is_word_char(c),
            Self::NonWord => !is_word_char(c),
            Self::Space => c.is_whitespace(),
            Self::NonSpace => !c.is_whitespace(),
            Self::Digit => c.is_ascii_digit(),
            Self::NonDigit => !c.is_ascii_digit(),
            Self::Boundary | Self::NonBoundary => {
                unreachable!("word boundaries don't match characters")
            }
        }
    }
}

/// Characters matched by `\w`, which also define where `\b` matches.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// POSIX character classes, like `[:alpha:]`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum PosixClass {
    Alnum = 0x00,
    Alpha = 0x01,
    Blank = 0x02,
    Cntrl = 0x03,
    Digit = 0x04,
    Graph = 0x05,
    Lower = 0x06,
    Print = 0x07,
    Punct = 0x08,
    Space = 0x09,
    Upper = 0x0A,
    XDigit = 0x0B,
    JavaStart = 0x0C,
    JavaPart = 0x0D,
}

lazy_static! {
    // Names accepted between `[:` and `:]`.
    static ref POSIX_CLASSES: HashMap<&'static str, PosixClass> =
        HashMap::from([
            ("alnum", PosixClass::Alnum),
            ("alpha", PosixClass::Alpha),
            ("blank", PosixClass::Blank),
            ("cntrl", PosixClass::Cntrl),
            ("digit", PosixClass::Digit),
            ("graph", PosixClass::Graph),
            ("lower", PosixClass::Lower),
            ("print", PosixClass::Print),
            ("punct", PosixClass::Punct),
            ("space", PosixClass::Space),
            ("upper", PosixClass::Upper),
            ("xdigit", PosixClass::XDigit),
            ("javastart", PosixClass::JavaStart),
            ("javapart", PosixClass::JavaPart),
        ]);
}

impl PosixClass {
    /// Looks up a class by the name used in the pattern.
    pub fn from_name(name: &str) -> Option<Self> {
        POSIX_CLASSES.get(name).copied()
    }

    /// The name used for the class in patterns.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Alnum => "alnum",
            Self::Alpha => "alpha",
            Self::Blank => "blank",
            Self::Cntrl => "cntrl",
            Self::Digit => "digit",
            Self::Graph => "graph",
            Self::Lower => "lower",
            Self::Print => "print",
            Self::Punct => "punct",
            Self::Space => "space",
            Self::Upper => "upper",
            Self::XDigit => "xdigit",
            Self::JavaStart => "javastart",
            Self::JavaPart => "javapart",
        }
    }

    /// Returns true if `c` belongs to the class.
    pub fn matches(&self, c: char) -> bool {
        match self {
            Self::Alnum => c.is_alphanumeric(),
            Self::Alpha => c.is_alphabetic(),
            Self::Blank => c == '\t' || (c.is_whitespace() && !c.is_control()),
            Self::Cntrl => c.is_control(),
            Self::Digit => c.is_ascii_digit(),
            Self::Graph => !c.is_control() && !c.is_whitespace(),
            Self::Lower => c.is_lowercase(),
            Self::Print => !c.is_control(),
            Self::Punct => {
                c.is_ascii_punctuation()
                    || (!c.is_ascii()
                        && !c.is_alphanumeric()
                        && !c.is_whitespace()
                        && !c.is_control())
            }
            Self::Space => c.is_whitespace(),
            Self::Upper => c.is_uppercase(),
            Self::XDigit => c.is_ascii_hexdigit(),
            Self::JavaStart => c.is_alphabetic() || c == '$' || c == '_',
            Self::JavaPart => c.is_alphanumeric() || c == '$' || c == '_',
        }
    }
}

/// Instructions supported by the matcher.
pub enum Instr<'a> {
    /// The match has succeeded.
    End,
    /// Matches the start of the input, or the start of a line in multiline
    /// mode (`^`).
    Bol,
    /// Matches the end of the input, or the end of a line in multiline mode
    /// (`$`).
    Eol,
    /// Matches any character, line terminators only in single-line mode.
    Any,
    /// Matches a character that is in any of the ranges.
    AnyOf(ClassRanges<'a>),
    /// Tries the node that follows as one alternative. If `next` points to
    /// another branch, that branch is the following alternative.
    Branch,
    /// Matches a run of literal characters.
    Atom(Literal<'a>),
    Star,
    Plus,
    Maybe,
    /// Class shorthand or word boundary.
    Escape(EscapeClass),
    /// Start of capturing group.
    Open(u16),
    /// End of capturing group.
    Close(u16),
    /// Start of a non-capturing group.
    OpenCluster,
    /// End of a non-capturing group.
    CloseCluster,
    /// Matches the text captured by some previous group.
    Backref(u16),
    /// Unconditional jump to `next`.
    Goto,
    /// Matches the empty string.
    Nothing,
    /// Zero or more repetitions of the body, as few as possible.
    ReluctantStar,
    /// One or more repetitions of the body, as few as possible.
    ReluctantPlus,
    /// Zero or one repetitions of the body, preferring zero.
    ReluctantMaybe,
    /// Matches a character in a POSIX class.
    PosixClass(PosixClass),
}

/// A node decoded from the program.
pub struct Node<'a> {
    /// Address of the node's first word.
    pub addr: usize,
    /// The opcode, exactly as found in the header.
    pub opcode: Opcode,
    /// The decoded instruction.
    pub instr: Instr<'a>,
    /// Offset to the next node, relative to `addr`.
    pub next: Offset,
    /// Number of words used by the node, including inline data.
    pub size: usize,
}

impl<'a> Node<'a> {
    /// Address of the next node. If the node has no successor this is the
    /// address of the node itself.
    #[inline]
    pub fn next_addr(&self) -> usize {
        (self.addr as isize + self.next as isize) as usize
    }

    /// Decodes the node that starts at `addr`, returning `None` if the words
    /// at that address don't form a valid node.
    pub fn try_decode(code: &'a [u32], addr: usize) -> Option<Self> {
        let header = code.get(addr..addr.checked_add(NODE_SIZE)?)?;
        let opcode = Opcode::from_u32(header[OFFSET_OPCODE])?;
        let opdata = header[OFFSET_OPDATA];
        let next = header[OFFSET_NEXT] as Offset;

        if opdata > MAX_OPDATA {
            return None;
        }

        let data = addr + NODE_SIZE;
        let mut size = NODE_SIZE;

        let instr = match opcode {
            Opcode::End => Instr::End,
            Opcode::Bol => Instr::Bol,
            Opcode::Eol => Instr::Eol,
            Opcode::Any => Instr::Any,
            Opcode::AnyOf => {
                let len = 2 * opdata as usize;
                size += len;
                Instr::AnyOf(ClassRanges(code.get(data..data + len)?))
            }
            Opcode::Branch => Instr::Branch,
            Opcode::Atom => {
                let len = opdata as usize;
                size += len;
                Instr::Atom(Literal(code.get(data..data + len)?))
            }
            Opcode::Star => Instr::Star,
            Opcode::Plus => Instr::Plus,
            Opcode::Maybe => Instr::Maybe,
            Opcode::Escape => Instr::Escape(EscapeClass::from_u32(opdata)?),
            Opcode::Open => Instr::Open(opdata as u16),
            Opcode::Close => Instr::Close(opdata as u16),
            Opcode::OpenCluster => Instr::OpenCluster,
            Opcode::CloseCluster => Instr::CloseCluster,
            Opcode::Backref => Instr::Backref(opdata as u16),
            Opcode::Goto => Instr::Goto,
            Opcode::Nothing => Instr::Nothing,
            Opcode::ReluctantStar => Instr::ReluctantStar,
            Opcode::ReluctantPlus => Instr::ReluctantPlus,
            Opcode::ReluctantMaybe => Instr::ReluctantMaybe,
            Opcode::PosixClass => {
                Instr::PosixClass(PosixClass::from_u32(opdata)?)
            }
        };

        Some(Self { addr, opcode, instr, next, size })
    }

    /// Decodes the node that starts at `addr`.
    ///
    /// # Panics
    ///
    /// If the words at `addr` don't form a valid node. Programs built by the
    /// compiler, or validated after deserialization, never cause this.
    #[inline]
    pub fn decode(code: &'a [u32], addr: usize) -> Self {
        match Self::try_decode(code, addr) {
            Some(node) => node,
            None => panic!("corrupt program: invalid node at {:05}", addr),
        }
    }
}

/// Iterates over the nodes of a program in address order, skipping the
/// inline data that follows `ATOM` and `ANYOF` nodes.
pub struct NodeParser<'a> {
    code: &'a [u32],
    addr: usize,
}

impl<'a> NodeParser<'a> {
    pub fn new(code: &'a [u32]) -> Self {
        Self { code, addr: 0 }
    }
}

impl<'a> Iterator for NodeParser<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.addr >= self.code.len() {
            return None;
        }
        let node = Node::decode(self.code, self.addr);
        self.addr += node.size;
        Some(node)
    }
}

/// The literal characters that follow an `ATOM` node.
pub struct Literal<'a>(&'a [u32]);

impl<'a> Literal<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the characters in the literal.
    pub fn chars(&self) -> impl Iterator<Item = char> + 'a {
        self.0.iter().map(|c| to_char(*c))
    }
}

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.chars() {
            write!(f, "{}", c.escape_debug())?;
        }
        write!(f, "\"")
    }
}

/// The ranges that follow an `ANYOF` node.
pub struct ClassRanges<'a>(&'a [u32]);

impl<'a> ClassRanges<'a> {
    /// Number of ranges in the class.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the ranges in the class. Both ends of each
    /// range are inclusive.
    pub fn ranges(&self) -> impl Iterator<Item = (char, char)> + 'a {
        self.0.chunks_exact(2).map(|r| (to_char(r[0]), to_char(r[1])))
    }

    /// Returns true if the class contains `c`. With `fold` the class also
    /// contains the lowercase and uppercase forms of `c`, the ranges
    /// themselves are never folded.
    pub fn contains(&self, c: char, fold: bool) -> bool {
        let in_ranges =
            |c: char| self.ranges().any(|(min, max)| c >= min && c <= max);

        in_ranges(c)
            || (fold && (in_ranges(fold_case(c)) || in_ranges(upper_case(c))))
    }
}

/// Lowercases a character when its lowercase form is a single character,
/// otherwise returns it unchanged.
#[inline]
pub fn fold_case(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Uppercases a character when its uppercase form is a single character,
/// otherwise returns it unchanged.
#[inline]
fn upper_case(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_uppercase();
    }
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

#[inline]
fn to_char(c: u32) -> char {
    char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Returns true if `c` terminates a line: LF, CR, NEL, LINE SEPARATOR or
/// PARAGRAPH SEPARATOR.
#[inline]
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}
