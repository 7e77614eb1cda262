/*! Executes compiled programs against some input.

The matcher is a recursive backtracking interpreter. [`Exec::match_nodes`]
walks the chain of nodes starting at a given address, and whenever there
are multiple ways to go on (alternatives, closures, groups) it calls itself
for trying one of them, and tries the next one if the recursive call fails.

Match state like the spans of capturing groups lives in a [`MatchState`],
which is separate from the [`Matcher`] so that it can be reused among
matches without allocating memory every time.
*/

use bitmask::bitmask;
#[cfg(feature = "logging")]
use log::*;

use crate::program::instr::{
    fold_case, is_line_terminator, is_word_char, EscapeClass, Instr, Node,
    Opcode, NODE_SIZE, OFFSET_NEXT, OFFSET_OPCODE,
};
use crate::program::Program;

pub use input::{Input, ReaderInput, StrInput};

mod input;


bitmask! {
    /// Flags that change how a program is matched.
    ///
    /// * `CaseInsensitive`: letters match regardless of their case.
    /// * `Multiline`: `^` and `$` also match at the start and end of every
    ///   line.
    /// * `SingleLine`: `.` matches line terminators too.
    #[derive(Debug)]
    pub mask MatchFlagSet: u8 where flags MatchFlags {
        CaseInsensitive = 0x01,
        Multiline       = 0x02,
        SingleLine      = 0x04,
    }
}

/// Mutable state of a match.
///
/// Contains the spans of the capturing groups found by the last match,
/// and the bookkeeping for the step and depth limits.
#[derive(Debug, Default, Clone)]
pub struct MatchState {
    starts: Vec<Option<usize>>,
    ends: Vec<Option<usize>>,
    steps: u64,
    depth: usize,
    limit_exceeded: bool,
}

impl MatchState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups recorded, including group 0. When groups were not
    /// recorded only group 0 is available.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.starts.len()
    }

    /// Returns the span of group `i`, or `None` if the group didn't
    /// participate in the match.
    pub fn group(&self, i: usize) -> Option<(usize, usize)> {
        match (self.start(i), self.end(i)) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    /// Index where group `i` starts.
    #[inline]
    pub fn start(&self, i: usize) -> Option<usize> {
        self.starts.get(i).copied().flatten()
    }

    /// Index where group `i` ends.
    #[inline]
    pub fn end(&self, i: usize) -> Option<usize> {
        self.ends.get(i).copied().flatten()
    }

    /// True if the last match was aborted because it reached the step or
    /// depth limit.
    #[inline]
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    /// Number of nodes visited by the last match. Only counted when there
    /// is a step limit.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn reset(&mut self, groups: usize) {
        self.starts.clear();
        self.starts.resize(groups, None);
        self.ends.clear();
        self.ends.resize(groups, None);
        self.steps = 0;
        self.depth = 0;
        self.limit_exceeded = false;
    }

    fn clear_groups(&mut self) {
        self.starts.fill(None);
        self.ends.fill(None);
    }
}

/// Matches a [`Program`] against inputs.
#[derive(Clone)]
pub struct Matcher<'p> {
    program: &'p Program,
    flags: MatchFlagSet,
    step_limit: Option<u64>,
    depth_limit: Option<usize>,
    record_groups: bool,
}

impl<'p> Matcher<'p> {
    /// Creates a matcher for `program`. By default there are no limits,
    /// no flags, and every group is recorded.
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            flags: MatchFlagSet::none(),
            step_limit: None,
            depth_limit: None,
            record_groups: true,
        }
    }

    /// Sets the match flags.
    pub fn flags(mut self, flags: MatchFlagSet) -> Self {
        self.flags = flags;
        self
    }

    /// Maximum number of nodes visited in a single call to
    /// [`Matcher::find_at`]. When the limit is reached the search stops and
    /// reports no match.
    pub fn step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Maximum recursion depth of the interpreter. When the limit is reached
    /// the search stops and reports no match.
    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Whether the spans of capturing groups other than group 0 must be
    /// recorded. Programs with backreferences always record them.
    pub fn record_groups(mut self, yes: bool) -> Self {
        self.record_groups = yes;
        self
    }

    /// The program executed by this matcher.
    #[inline]
    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Looks for a match that starts at `start` or after it. On success the
    /// spans of the groups are stored in `state`.
    ///
    /// Returns false if `start` is past the end of the input.
    pub fn find_at<I: Input + ?Sized>(
        &self,
        input: &I,
        start: usize,
        state: &mut MatchState,
    ) -> bool {
        state.reset(self.group_count());

        if start > 0 && input.is_end(start - 1) {
            return false;
        }

        let fold = self.flags.contains(MatchFlags::CaseInsensitive);
        let mut i = start;

        let found = loop {
            let candidate = match self.program.prefix() {
                None => true,
                Some(prefix) => {
                    if !prefix.is_empty() && input.is_end(i + prefix.len() - 1)
                    {
                        break false;
                    }
                    prefix.iter().enumerate().all(|(j, c)| {
                        chars_eq(input.char_at(i + j), *c, fold)
                    })
                }
            };

            if candidate && self.try_at(input, i, state) {
                break true;
            }

            if state.limit_exceeded || input.is_end(i) {
                break false;
            }

            i += 1;
        };

        #[cfg(feature = "logging")]
        if state.limit_exceeded {
            warn!(
                "match aborted at position {} after {} steps",
                i, state.steps
            );
        }

        found
    }

    /// Checks whether the program matches at exactly position `i`.
    pub fn match_at<I: Input + ?Sized>(
        &self,
        input: &I,
        i: usize,
        state: &mut MatchState,
    ) -> bool {
        state.reset(self.group_count());

        if i > 0 && input.is_end(i - 1) {
            return false;
        }

        self.try_at(input, i, state)
    }

    fn group_count(&self) -> usize {
        if self.record_groups || self.program.has_backrefs() {
            self.program.paren_count()
        } else {
            1
        }
    }

    fn try_at<I: Input + ?Sized>(
        &self,
        input: &I,
        i: usize,
        state: &mut MatchState,
    ) -> bool {
        state.clear_groups();
        state.starts[0] = Some(i);

        let code = self.program.code();

        let mut exec = Exec {
            code,
            input,
            flags: self.flags,
            state: &mut *state,
            step_limit: self.step_limit,
            depth_limit: self.depth_limit,
            pending: Vec::new(),
        };

        match exec.match_nodes(0, code.len(), i) {
            Some(end) => {
                state.ends[0] = Some(end);
                true
            }
            None => {
                state.starts[0] = None;
                false
            }
        }
    }
}

/// Compares two characters, ignoring their case if `fold` is true.
#[inline]
fn chars_eq(a: char, b: char, fold: bool) -> bool {
    a == b || (fold && fold_case(a) == fold_case(b))
}

/// The body of a reluctant closure that is being matched.
#[derive(Clone, Copy)]
struct PendingBody {
    /// Opcode of the closure.
    opcode: Opcode,
    /// Address of the closure node.
    node: usize,
    /// Address of the node that follows the closure.
    next: usize,
    last: usize,
    /// Address of the `END` node that closes the body.
    end: usize,
    /// Position where the current iteration of the body started.
    start: usize,
}

/// Execution of a program at a given starting position.
struct Exec<'a, I: Input + ?Sized> {
    code: &'a [u32],
    input: &'a I,
    flags: MatchFlagSet,
    state: &'a mut MatchState,
    step_limit: Option<u64>,
    depth_limit: Option<usize>,
    /// Reluctant closures whose bodies are being matched, innermost last.
    pending: Vec<PendingBody>,
}

impl<'a, I: Input + ?Sized> Exec<'a, I> {
    /// Matches the chain of nodes that starts at `node`, which must end
    /// before `last`, with the input at `pos`.
    ///
    /// Returns the position where the match ends, or `None` if there's no
    /// match.
    fn match_nodes(
        &mut self,
        node: usize,
        last: usize,
        pos: usize,
    ) -> Option<usize> {
        if let Some(limit) = self.depth_limit {
            if self.state.depth >= limit {
                self.state.limit_exceeded = true;
            }
        }

        if self.state.limit_exceeded {
            return None;
        }

        self.state.depth += 1;
        let result = self.match_chain(node, last, pos);
        self.state.depth -= 1;
        result
    }

    fn match_chain(
        &mut self,
        mut node: usize,
        last: usize,
        mut pos: usize,
    ) -> Option<usize> {
        let fold = self.flags.contains(MatchFlags::CaseInsensitive);

        while node < last {
            if !self.step() {
                return None;
            }

            let current = Node::decode(self.code, node);
            let next = current.next_addr();

            match current.instr {
                Instr::End => {
                    return match self.pending.pop() {
                        Some(body) if body.end == node => {
                            let result = self.body_matched(body, pos);
                            self.pending.push(body);
                            result
                        }
                        Some(body) => {
                            self.pending.push(body);
                            Some(pos)
                        }
                        None => Some(pos),
                    };
                }
                Instr::Nothing
                | Instr::Goto
                | Instr::OpenCluster
                | Instr::CloseCluster => {}
                Instr::Bol => {
                    if !self.is_bol(pos) {
                        return None;
                    }
                }
                Instr::Eol => {
                    if !self.is_eol(pos) {
                        return None;
                    }
                }
                Instr::Any => {
                    if self.input.is_end(pos) {
                        return None;
                    }
                    if !self.flags.contains(MatchFlags::SingleLine)
                        && is_line_terminator(self.input.char_at(pos))
                    {
                        return None;
                    }
                    pos += 1;
                }
                Instr::AnyOf(class) => {
                    if self.input.is_end(pos)
                        || !class.contains(self.input.char_at(pos), fold)
                    {
                        return None;
                    }
                    pos += 1;
                }
                Instr::PosixClass(class) => {
                    if self.input.is_end(pos)
                        || !class.matches(self.input.char_at(pos))
                    {
                        return None;
                    }
                    pos += 1;
                }
                Instr::Escape(class) => {
                    if class.is_boundary() {
                        let prev = if pos == 0 {
                            '\n'
                        } else {
                            self.input.char_at(pos - 1)
                        };
                        let next = if self.input.is_end(pos) {
                            '\n'
                        } else {
                            self.input.char_at(pos)
                        };
                        let at_boundary =
                            is_word_char(prev) != is_word_char(next);
                        if at_boundary != (class == EscapeClass::Boundary) {
                            return None;
                        }
                    } else {
                        if self.input.is_end(pos)
                            || !class.matches(self.input.char_at(pos))
                        {
                            return None;
                        }
                        pos += 1;
                    }
                }
                Instr::Atom(literal) => {
                    let len = literal.len();
                    if len > 0 && self.input.is_end(pos + len - 1) {
                        return None;
                    }
                    for (i, c) in literal.chars().enumerate() {
                        if !chars_eq(self.input.char_at(pos + i), c, fold) {
                            return None;
                        }
                    }
                    pos += len;
                }
                Instr::Backref(n) => {
                    let (start, end) = self.state.group(n as usize)?;
                    let len = end - start;
                    if len > 0 {
                        if self.input.is_end(pos + len - 1) {
                            return None;
                        }
                        for i in 0..len {
                            if !chars_eq(
                                self.input.char_at(pos + i),
                                self.input.char_at(start + i),
                                fold,
                            ) {
                                return None;
                            }
                        }
                        pos += len;
                    }
                }
                Instr::Open(n) => {
                    let n = n as usize;
                    if n < self.state.starts.len() {
                        let saved = self.state.starts[n];
                        self.state.starts[n] = Some(pos);
                        let result = self.match_nodes(next, last, pos);
                        if result.is_none() {
                            self.state.starts[n] = saved;
                        }
                        return result;
                    }
                }
                Instr::Close(n) => {
                    let n = n as usize;
                    if n < self.state.ends.len() {
                        let saved = self.state.ends[n];
                        self.state.ends[n] = Some(pos);
                        let result = self.match_nodes(next, last, pos);
                        if result.is_none() {
                            self.state.ends[n] = saved;
                        }
                        return result;
                    }
                }
                Instr::Branch => {
                    // A branch that is not followed by another one is the
                    // only alternative, there's nothing to backtrack.
                    if self.opcode(next) != Opcode::Branch as u32 {
                        node += NODE_SIZE;
                        continue;
                    }
                    let mut branch = node;
                    loop {
                        if let Some(end) =
                            self.match_nodes(branch + NODE_SIZE, last, pos)
                        {
                            return Some(end);
                        }
                        let offset = self.code[branch + OFFSET_NEXT] as i32;
                        if offset == 0 {
                            return None;
                        }
                        branch = (branch as isize + offset as isize) as usize;
                        if self.opcode(branch) != Opcode::Branch as u32 {
                            return None;
                        }
                    }
                }
                Instr::ReluctantStar => {
                    return self.reluctant_star(node, next, last, pos);
                }
                Instr::ReluctantPlus => {
                    return self.reluctant_body(
                        Opcode::ReluctantPlus,
                        node,
                        next,
                        last,
                        pos,
                    );
                }
                Instr::ReluctantMaybe => {
                    if let Some(end) = self.match_nodes(next, last, pos) {
                        return Some(end);
                    }
                    return self.reluctant_body(
                        Opcode::ReluctantMaybe,
                        node,
                        next,
                        last,
                        pos,
                    );
                }
                Instr::Star | Instr::Plus | Instr::Maybe => {
                    panic!(
                        "corrupt program: unexpected {} at {:05}",
                        current.opcode.name(),
                        node
                    )
                }
            }

            node = next;
        }

        if self.state.limit_exceeded {
            return None;
        }

        panic!("corrupt program: node chain ended at {:05}", node)
    }

    #[inline]
    fn opcode(&self, addr: usize) -> u32 {
        self.code[addr + OFFSET_OPCODE]
    }

    /// Counts one step, returns false if the step limit was exceeded.
    #[inline]
    fn step(&mut self) -> bool {
        if let Some(limit) = self.step_limit {
            self.state.steps += 1;
            if self.state.steps > limit {
                self.state.limit_exceeded = true;
                return false;
            }
        }
        true
    }

    fn is_bol(&self, pos: usize) -> bool {
        if pos == 0 {
            return true;
        }
        if !self.flags.contains(MatchFlags::Multiline) {
            return false;
        }
        let prev = self.input.char_at(pos - 1);
        if !is_line_terminator(prev) {
            return false;
        }
        // The position between CR and LF is not the start of a line.
        !(prev == '\r'
            && !self.input.is_end(pos)
            && self.input.char_at(pos) == '\n')
    }

    fn is_eol(&self, pos: usize) -> bool {
        if self.input.is_end(pos) {
            return true;
        }
        if !self.flags.contains(MatchFlags::Multiline) {
            return false;
        }
        let c = self.input.char_at(pos);
        if !is_line_terminator(c) {
            return false;
        }
        !(c == '\n' && pos > 0 && self.input.char_at(pos - 1) == '\r')
    }

    /// Tries the continuation of a `*?` closure at `pos`, and if it fails,
    /// one more iteration of its body.
    fn reluctant_star(
        &mut self,
        node: usize,
        next: usize,
        last: usize,
        pos: usize,
    ) -> Option<usize> {
        if let Some(end) = self.match_nodes(next, last, pos) {
            return Some(end);
        }
        self.reluctant_body(Opcode::ReluctantStar, node, next, last, pos)
    }

    /// Matches the body of the reluctant closure at `node`. When the body
    /// reaches its `END` the match goes on in [`Exec::body_matched`], so
    /// that the alternatives inside the body are retried if what follows
    /// the closure fails.
    fn reluctant_body(
        &mut self,
        opcode: Opcode,
        node: usize,
        next: usize,
        last: usize,
        pos: usize,
    ) -> Option<usize> {
        self.pending.push(PendingBody {
            opcode,
            node,
            next,
            last,
            end: next - NODE_SIZE,
            start: pos,
        });
        let result = self.match_nodes(node + NODE_SIZE, last, pos);
        self.pending.pop();
        result
    }

    fn body_matched(
        &mut self,
        body: PendingBody,
        pos: usize,
    ) -> Option<usize> {
        match body.opcode {
            Opcode::ReluctantMaybe => {
                self.match_nodes(body.next, body.last, pos)
            }
            // After one iteration of a `+?` body the rest is like `*?`.
            // An iteration that doesn't consume anything can't help.
            _ if pos == body.start => None,
            _ => self.reluctant_star(body.node, body.next, body.last, pos),
        }
    }
}
