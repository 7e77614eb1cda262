use crate::errors::Error;
use crate::program::instr::{
    Offset, Opcode, MAX_OPDATA, NODE_SIZE, OFFSET_NEXT, OFFSET_OPCODE,
    OFFSET_OPDATA,
};

/// Maximum number of words in a program.
pub(crate) const MAX_PROGRAM_SIZE: usize = 1 << 24;

/// A growable sequence of nodes, used by the compiler while the program is
/// being built.
///
/// Nodes are identified by the address of their first word. Addresses are
/// stable except when [`NodeSeq::insert`] shifts the tail of the sequence.
#[derive(Default)]
pub(crate) struct NodeSeq {
    code: Vec<u32>,
}

impl NodeSeq {
    pub fn new() -> Self {
        Self { code: Vec::with_capacity(128) }
    }

    /// Address where the next node will be emitted.
    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns the opcode of the node at `addr`.
    ///
    /// # Panics
    ///
    /// If `addr` is not the address of a node.
    #[inline]
    pub fn opcode(&self, addr: usize) -> u32 {
        self.code[addr + OFFSET_OPCODE]
    }

    /// Returns the offset to the successor of the node at `addr`. Addresses
    /// at the end of the sequence or beyond it have no successor.
    #[inline]
    pub fn next(&self, addr: usize) -> Offset {
        self.code.get(addr + OFFSET_NEXT).map_or(0, |next| *next as Offset)
    }

    /// Appends a node and returns its address.
    pub fn emit(&mut self, opcode: Opcode, opdata: u32) -> Result<usize, Error> {
        if opdata > MAX_OPDATA {
            return Err(Error::TooLarge);
        }
        self.reserve(NODE_SIZE)?;
        let addr = self.code.len();
        self.code.extend_from_slice(&[opcode as u32, opdata, 0]);
        Ok(addr)
    }

    /// Appends a word of inline data to the last node.
    pub fn emit_word(&mut self, word: u32) -> Result<(), Error> {
        self.reserve(1)?;
        self.code.push(word);
        Ok(())
    }

    /// Replaces the `opdata` of the node at `addr`.
    pub fn set_opdata(&mut self, addr: usize, opdata: usize) -> Result<(), Error> {
        if opdata > MAX_OPDATA as usize {
            return Err(Error::TooLarge);
        }
        self.code[addr + OFFSET_OPDATA] = opdata as u32;
        Ok(())
    }

    /// Inserts a node at `addr`, shifting every word from `addr` onwards.
    ///
    /// Offsets are relative, so the nodes that are shifted remain linked
    /// among them. Nodes before `addr` must not point to `addr` or beyond.
    pub fn insert(
        &mut self,
        opcode: Opcode,
        opdata: u32,
        addr: usize,
    ) -> Result<(), Error> {
        self.reserve(NODE_SIZE)?;
        self.code.splice(addr..addr, [opcode as u32, opdata, 0]);
        Ok(())
    }

    /// Discards every word from `addr` onwards.
    pub fn truncate(&mut self, addr: usize) {
        self.code.truncate(addr)
    }

    /// Follows the chain of nodes that starts at `addr` and makes the last
    /// one point to `target`.
    ///
    /// If the walk goes through `target` itself, the last node is linked
    /// to the end of the sequence instead, that is, to whatever node gets
    /// emitted next.
    pub fn set_next_of_end(
        &mut self,
        mut addr: usize,
        mut target: usize,
    ) -> Result<(), Error> {
        let mut steps = 0;
        let mut next = self.next(addr);

        while next != 0 && addr < self.len() {
            if addr == target {
                target = self.len();
            }
            addr = (addr as isize + next as isize) as usize;
            next = self.next(addr);
            steps += 1;
            if steps > self.len() {
                return Err(Error::Internal(format!(
                    "node chain starting at {:05} never ends",
                    addr
                )));
            }
        }

        if addr < self.len() {
            let offset: Offset = (target as isize - addr as isize)
                .try_into()
                .map_err(|_| Error::TooLarge)?;
            self.code[addr + OFFSET_NEXT] = offset as u32;
        }

        Ok(())
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.code
    }

    fn reserve(&mut self, words: usize) -> Result<(), Error> {
        if self.code.len() + words > MAX_PROGRAM_SIZE {
            return Err(Error::TooLarge);
        }
        Ok(())
    }
}
