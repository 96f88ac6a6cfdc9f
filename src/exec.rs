// The backtracking matching engine.
//
// The matcher keeps its pending choice points on an explicit heap-allocated
// stack of jobs instead of the native call stack, so deeply backtracking
// patterns grow a vector rather than overflowing the stack. The search
// order is unchanged: alternatives are tried first to last, and repetitions
// greedily, backing off one count at a time.

use crate::compile::fold;
use crate::prog::{InstPtr, Op, Program};

/// Capture offsets for one match attempt: two slots per group, `None` when
/// the group did not participate.
pub(crate) type Slots = Vec<Option<usize>>;

/// Returns the `(start, end)` span of `group`, if it participated.
pub(crate) fn span(slots: &[Option<usize>], group: usize) -> Option<(usize, usize)> {
    match (slots.get(2 * group)?, slots.get(2 * group + 1)?) {
        (&Some(start), &Some(end)) => Some((start, end)),
        _ => None,
    }
}

/// Runs `prog` against `text`, trying start offsets from `start` on, and
/// returns the capture slots of the leftmost match.
pub(crate) fn exec(prog: &Program, text: &str, start: usize) -> Option<Slots> {
    if start > text.len() {
        return None;
    }
    trace!(
        "exec from {}: anchored: {}, start: {:?}",
        start,
        prog.anchored,
        prog.start_char
    );
    let mut m = Matcher {
        prog,
        text,
        slots: vec![None; 2 * prog.npar],
        jobs: Vec::new(),
    };
    if prog.anchored {
        // An anchored match need be tried only once.
        if m.try_at(start) {
            return Some(m.slots);
        }
        None
    } else if let Some(ch) = prog.start_char {
        // We know what character the match must start with.
        let mut at = start;
        while at < text.len() {
            at = match m.find_start(ch, at) {
                Some(found) => found,
                None => break,
            };
            if m.try_at(at) {
                return Some(m.slots);
            }
            at += text[at..].chars().next().map_or(1, char::len_utf8);
        }
        None
    } else {
        // Unanchored: every boundary, including the empty tail.
        let mut at = start;
        loop {
            if m.try_at(at) {
                return Some(m.slots);
            }
            if at >= text.len() {
                return None;
            }
            at += text[at..].chars().next().map_or(1, char::len_utf8);
        }
    }
}

/// One unit of pending work on the explicit backtracking stack.
///
/// `Restore` entries undo a capture slot when everything pushed above them
/// has failed, so slots written on an abandoned path never leak into
/// another.
#[derive(Clone, Copy, Debug)]
enum Job {
    Step { pc: InstPtr, at: usize },
    Repeat { pc: InstPtr, count: usize, at: usize },
    Restore { slot: usize, old: Option<usize> },
}

struct Matcher<'r, 't> {
    prog: &'r Program,
    text: &'t str,
    slots: Slots,
    jobs: Vec<Job>,
}

impl<'r, 't> Matcher<'r, 't> {
    /// Tries for a match beginning exactly at `start`.
    fn try_at(&mut self, start: usize) -> bool {
        self.jobs.clear();
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.jobs.push(Job::Step { pc: 0, at: start });
        while let Some(job) = self.jobs.pop() {
            let matched = match job {
                Job::Step { pc, at } => self.step(pc, at),
                Job::Repeat { pc, count, at } => self.repeat(pc, count, at),
                Job::Restore { slot, old } => {
                    self.slots[slot] = old;
                    false
                }
            };
            if matched {
                self.slots[0] = Some(start);
                return true;
            }
        }
        false
    }

    /// Runs instructions from `pc`, looping in place through ordinary
    /// nodes and pushing a job wherever a real choice point exists.
    fn step(&mut self, mut pc: InstPtr, mut at: usize) -> bool {
        loop {
            match self.prog.insts[pc].op {
                Op::End => {
                    self.slots[1] = Some(at);
                    return true;
                }
                Op::Bol => {
                    if at != 0 {
                        return false;
                    }
                }
                Op::Eol => {
                    if at != self.text.len() {
                        return false;
                    }
                }
                Op::Any => match self.char_at(at) {
                    Some(c) => at += c.len_utf8(),
                    None => return false,
                },
                Op::Exactly(ref lit) => match self.match_literal(lit, at) {
                    Some(end) => at = end,
                    None => return false,
                },
                Op::AnyOf(ref set) => match self.char_at(at) {
                    Some(c) if set.contains(self.fold(c)) => at += c.len_utf8(),
                    _ => return false,
                },
                Op::AnyBut(ref set) => match self.char_at(at) {
                    Some(c) if !set.contains(self.fold(c)) => at += c.len_utf8(),
                    _ => return false,
                },
                Op::Nothing | Op::Back => {}
                Op::Branch => {
                    // A branch chained to another branch is a real
                    // alternation; otherwise it is mandatory and we fall
                    // straight into its body.
                    if let Some(alt) = self.prog.next(pc) {
                        if let Op::Branch = self.prog.insts[alt].op {
                            self.jobs.push(Job::Step { pc: alt, at });
                        }
                    }
                    pc += 1;
                    continue;
                }
                Op::Star | Op::Plus => {
                    let (count, end) = self.repeat_max(pc + 1, at);
                    return self.repeat(pc, count, end);
                }
                Op::Open(n) => {
                    let slot = 2 * n as usize;
                    self.jobs.push(Job::Restore { slot, old: self.slots[slot] });
                    self.slots[slot] = Some(at);
                }
                Op::Close(n) => {
                    let slot = 2 * n as usize + 1;
                    self.jobs.push(Job::Restore { slot, old: self.slots[slot] });
                    self.slots[slot] = Some(at);
                }
            }
            pc = match self.prog.next(pc) {
                Some(next) => next,
                None => return false,
            };
        }
    }

    /// Tries the continuation of the `Star`/`Plus` at `pc` with `count`
    /// repetitions already consumed up to `at`, queueing a retry at
    /// `count - 1` for when it fails.
    ///
    /// When the continuation opens with a literal, counts whose next
    /// subject character cannot start it are skipped without being tried.
    fn repeat(&mut self, pc: InstPtr, mut count: usize, mut at: usize) -> bool {
        let min = if let Op::Plus = self.prog.insts[pc].op {
            1
        } else {
            0
        };
        let next = match self.prog.next(pc) {
            Some(next) => next,
            None => return false,
        };
        let look = match self.prog.insts[next].op {
            Op::Exactly(ref lit) => lit.chars().next(),
            _ => None,
        };
        loop {
            if count < min {
                return false;
            }
            let viable = match look {
                None => true,
                Some(want) => self.char_at(at).map_or(false, |c| self.fold(c) == want),
            };
            if viable {
                if count > min {
                    let retry = self.back_one(at);
                    self.jobs.push(Job::Repeat { pc, count: count - 1, at: retry });
                }
                self.jobs.push(Job::Step { pc: next, at });
                return false;
            }
            if count == min {
                return false;
            }
            count -= 1;
            at = self.back_one(at);
        }
    }

    /// Greedily consumes the one-character-wide operand at `pc` as many
    /// times as it will go, reporting how many and where that left the
    /// cursor.
    fn repeat_max(&self, pc: InstPtr, mut at: usize) -> (usize, usize) {
        let mut count = 0;
        match self.prog.insts[pc].op {
            Op::Any => {
                // `.` repeated swallows everything to the end.
                count = self.text.get(at..).map_or(0, |rest| rest.chars().count());
                at = self.text.len();
            }
            Op::Exactly(ref lit) => {
                if let Some(want) = lit.chars().next() {
                    while let Some(c) = self.char_at(at) {
                        if self.fold(c) != want {
                            break;
                        }
                        at += c.len_utf8();
                        count += 1;
                    }
                }
            }
            Op::AnyOf(ref set) => {
                while let Some(c) = self.char_at(at) {
                    if !set.contains(self.fold(c)) {
                        break;
                    }
                    at += c.len_utf8();
                    count += 1;
                }
            }
            Op::AnyBut(ref set) => {
                while let Some(c) = self.char_at(at) {
                    if set.contains(self.fold(c)) {
                        break;
                    }
                    at += c.len_utf8();
                    count += 1;
                }
            }
            _ => {}
        }
        (count, at)
    }

    /// Matches the literal run `lit` at `at`, returning the new cursor.
    fn match_literal(&self, lit: &str, mut at: usize) -> Option<usize> {
        for want in lit.chars() {
            let c = self.char_at(at)?;
            if self.fold(c) != want {
                return None;
            }
            at += c.len_utf8();
        }
        Some(at)
    }

    /// Finds the next occurrence of the required start character at or
    /// after `at`.
    fn find_start(&self, want: char, at: usize) -> Option<usize> {
        if !self.prog.ignore_case && want.is_ascii() {
            memchr::memchr(want as u8, &self.text.as_bytes()[at..]).map(|i| at + i)
        } else {
            self.text[at..]
                .char_indices()
                .find(|&(_, c)| self.fold(c) == want)
                .map(|(i, _)| at + i)
        }
    }

    fn char_at(&self, at: usize) -> Option<char> {
        self.text.get(at..).and_then(|rest| rest.chars().next())
    }

    fn back_one(&self, at: usize) -> usize {
        self.text[..at]
            .chars()
            .next_back()
            .map_or(at, |c| at - c.len_utf8())
    }

    fn fold(&self, c: char) -> char {
        if self.prog.ignore_case {
            fold(c)
        } else {
            c
        }
    }
}
