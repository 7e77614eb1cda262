/*! Compiled regular expressions.

A [`Program`] is the output of the [`crate::Compiler`]: a flat buffer of
nodes (see [`instr`] for the encoding) plus a few facts computed once when
the program is finalized and used by the matcher to avoid useless work.
*/

use std::fmt::{Display, Formatter};
use std::io::{BufWriter, Read, Write};

use bincode::Options;
#[cfg(feature = "logging")]
use log::*;
use serde::{Deserialize, Serialize};

use crate::SerializationError;

pub use instr::{
    EscapeClass, Instr, Node, NodeParser, Opcode, PosixClass, NODE_SIZE,
};

use instr::MAX_OPDATA;

pub mod instr;

#[cfg(test)]
mod tests;

/// Header that starts every serialized program.
const MAGIC: &[u8] = b"REXP";

/// A compiled regular expression.
///
/// Programs are immutable, they can be shared among threads and matched by
/// any number of [`crate::Matcher`]s at the same time.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Program {
    /// The nodes, exactly sized.
    code: Box<[u32]>,

    /// Number of capturing groups, including the implicit group 0 that
    /// spans the whole match.
    paren_count: usize,

    /// Literal that every match must start with. Only present when the
    /// whole regexp starts with an atom that is not part of an alternation.
    #[serde(skip)]
    prefix: Option<Box<[char]>>,

    /// True if the program contains some `BACKREF` node.
    #[serde(skip)]
    has_backrefs: bool,
}

impl Program {
    /// Creates a program from the nodes emitted by the compiler, computing
    /// the prefix and the backreference flag.
    pub(crate) fn finalize(code: Vec<u32>, paren_count: usize) -> Self {
        let code = code.into_boxed_slice();

        let prefix = match (
            Node::try_decode(&code, 0),
            Node::try_decode(&code, NODE_SIZE),
        ) {
            (Some(first), Some(second))
                if first.opcode == Opcode::Branch
                    && second.opcode == Opcode::Atom =>
            {
                match (Node::try_decode(&code, first.next_addr()), second) {
                    (
                        Some(Node { opcode: Opcode::End, .. }),
                        Node { instr: Instr::Atom(literal), .. },
                    ) => Some(literal.chars().collect::<Box<[char]>>()),
                    _ => None,
                }
            }
            _ => None,
        };

        let has_backrefs = NodeParser::new(&code)
            .any(|node| node.opcode == Opcode::Backref);

        Self { code, paren_count, prefix, has_backrefs }
    }

    /// The words that make up the program.
    #[inline]
    pub fn code(&self) -> &[u32] {
        &self.code
    }

    /// Literal that any match must begin with, if known.
    #[inline]
    pub fn prefix(&self) -> Option<&[char]> {
        self.prefix.as_deref()
    }

    /// True if the regexp contains backreferences like `\1`.
    #[inline]
    pub fn has_backrefs(&self) -> bool {
        self.has_backrefs
    }

    /// Number of capturing groups, group 0 included.
    #[inline]
    pub fn paren_count(&self) -> usize {
        self.paren_count
    }

    /// Returns an iterator over the nodes in the program, in address order.
    pub fn nodes(&self) -> NodeParser<'_> {
        NodeParser::new(&self.code)
    }

    /// Serializes the program as a sequence of bytes.
    ///
    /// The program can be restored back by passing the bytes to
    /// [`Program::deserialize`].
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes a program from a sequence of bytes produced by
    /// [`Program::serialize`].
    pub fn deserialize<B>(bytes: B) -> Result<Self, SerializationError>
    where
        B: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();

        if bytes.len() < MAGIC.len() || &bytes[0..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        let program = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize::<Self>(&bytes[MAGIC.len()..])?;

        if !program.is_valid() {
            #[cfg(feature = "logging")]
            warn!("rejecting corrupt program");
            return Err(SerializationError::InvalidFormat);
        }

        Ok(Self::finalize(program.code.into_vec(), program.paren_count))
    }

    /// Serializes the program into a `writer`.
    pub fn serialize_into<W>(&self, writer: W) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);

        writer.write_all(MAGIC)?;

        bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(&mut writer, self)?;

        writer.flush()?;
        Ok(())
    }

    /// Deserializes a program from a `reader`.
    pub fn deserialize_from<R>(mut reader: R) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Self::deserialize(bytes)
    }

    /// Checks that the matcher can execute the program without running out
    /// of the buffer or finding something it doesn't understand.
    fn is_valid(&self) -> bool {
        let code = &self.code;

        if code.is_empty()
            || self.paren_count == 0
            || self.paren_count > MAX_OPDATA as usize + 1
        {
            return false;
        }

        let mut starts = vec![false; code.len()];
        let mut addr = 0;

        while addr < code.len() {
            match Node::try_decode(code, addr) {
                Some(node) => {
                    starts[addr] = true;
                    addr += node.size;
                }
                None => return false,
            }
        }

        let is_start = |addr: isize| {
            addr >= 0 && starts.get(addr as usize).copied().unwrap_or(false)
        };

        for node in self.nodes() {
            let target = node.addr as isize + node.next as isize;

            if node.next == 0 {
                if node.opcode != Opcode::End {
                    return false;
                }
            } else if !is_start(target) {
                return false;
            }

            let data = &code[node.addr + NODE_SIZE..node.addr + node.size];

            let valid = match &node.instr {
                // The compiler expresses these with branches, the matcher
                // doesn't execute them.
                Instr::Star | Instr::Plus | Instr::Maybe => false,
                // The body of a reluctant closure ends with an END right
                // before the closure's successor.
                Instr::ReluctantStar
                | Instr::ReluctantPlus
                | Instr::ReluctantMaybe => {
                    let end = target - NODE_SIZE as isize;
                    end > node.addr as isize
                        && is_start(end)
                        && code[end as usize] == Opcode::End as u32
                }
                Instr::Open(n) | Instr::Close(n) | Instr::Backref(n) => {
                    (*n as usize) < self.paren_count
                }
                Instr::Atom(_) => {
                    data.iter().all(|c| char::from_u32(*c).is_some())
                }
                Instr::AnyOf(_) => data
                    .chunks_exact(2)
                    .all(|r| {
                        char::from_u32(r[0]).is_some()
                            && char::from_u32(r[1]).is_some()
                            && r[0] <= r[1]
                    }),
                _ => true,
            };

            if !valid {
                return false;
            }
        }

        true
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;

        for node in self.nodes() {
            write!(f, "{:05}: {}", node.addr, node.opcode.name())?;

            match &node.instr {
                Instr::Atom(literal) => {
                    write!(f, " {}", literal)?;
                }
                Instr::AnyOf(class) => {
                    for (min, max) in class.ranges() {
                        write!(
                            f,
                            " [{}-{}]",
                            min.escape_debug(),
                            max.escape_debug()
                        )?;
                    }
                }
                Instr::Escape(class) => {
                    write!(f, " \\{}", class.as_char())?;
                }
                Instr::PosixClass(class) => {
                    write!(f, " [:{}:]", class.name())?;
                }
                Instr::Open(n) | Instr::Close(n) | Instr::Backref(n) => {
                    write!(f, " {}", n)?;
                }
                _ => {}
            }

            if node.next != 0 {
                write!(f, " -> {:05}", node.next_addr())?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
