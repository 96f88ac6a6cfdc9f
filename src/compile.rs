use crate::error::Error;
use crate::prog::{resolve_next, ClassBits, Inst, InstPtr, Op, Program};

// By convention each message is used in exactly one place, so a reported
// failure can be traced back to the branch of the parser that raised it.
const ERR_TOO_MANY_GROUPS: &str = "too many capture groups";
const ERR_UNCLOSED_GROUP: &str = "missing closing ')'";
const ERR_UNOPENED_GROUP: &str = "unexpected ')'";
const ERR_EMPTY_REPEAT: &str = "'*' or '+' operand could match the empty string";
const ERR_NESTED_REPEAT: &str = "repetition operator follows another repetition";
const ERR_DANGLING_REPEAT: &str = "repetition operator with nothing to repeat";
const ERR_UNCLOSED_CLASS: &str = "missing closing ']'";
const ERR_INVALID_CLASS_RANGE: &str = "inverted character class range";
const ERR_TRAILING_ESCAPE: &str = "dangling '\\' at end of pattern";

/// Group numbers must stay below this, counting group 0.
const MAX_GROUPS: usize = 100;

const META: &str = "^$.[()|?+*\\";

// Facts about the expression most recently parsed, reported by each parser
// level to its caller.
const WORST: u8 = 0;
/// Known never to match the empty string.
const HAS_WIDTH: u8 = 1 << 0;
/// A single one-character-wide node, plain enough to be a direct
/// `Star`/`Plus` operand.
const SIMPLE: u8 = 1 << 1;

fn is_repeat(c: char) -> bool {
    c == '*' || c == '+' || c == '?'
}

/// Case-folds one character. The folding is length-preserving on purpose:
/// match offsets must keep indexing the original subject, so a multi-char
/// lowercase expansion falls back to the character itself.
pub(crate) fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Compiles a pattern into an immutable program.
///
/// Case-insensitive compilation lower-cases the pattern up front; the
/// matcher then folds subject characters at comparison time.
pub(crate) fn compile(pattern: &str, ignore_case: bool) -> Result<Program, Error> {
    let parse: Vec<char> = if ignore_case {
        pattern.chars().map(fold).collect()
    } else {
        pattern.chars().collect()
    };
    let mut c = Compiler {
        chars: parse,
        off: 0,
        npar: 1,
        insts: Vec::with_capacity(16),
        flags: WORST,
    };
    c.expression(false)?;

    let mut prog = Program {
        insts: c.insts,
        npar: c.npar,
        anchored: false,
        start_char: None,
        ignore_case,
    };
    // The program starts with a branch node. When that is the only
    // top-level branch, the first instruction inside it decides the scan
    // strategy: a leading BOL anchors the whole pattern, and a leading
    // literal gives the matcher a character to skip-scan for.
    if let Some(pc) = prog.next(0) {
        if let Op::End = prog.insts[pc].op {
            match prog.insts.get(1).map(|inst| &inst.op) {
                Some(Op::Bol) => prog.anchored = true,
                Some(Op::Exactly(lit)) => prog.start_char = lit.chars().next(),
                _ => {}
            }
        }
    }
    trace!(
        "compiled {:?}: {} instructions, {} groups, anchored: {}, start: {:?}",
        pattern,
        prog.insts.len(),
        prog.npar,
        prog.anchored,
        prog.start_char
    );
    Ok(prog)
}

struct Compiler {
    chars: Vec<char>,
    off: usize,
    /// The next capture group number; group 0 is implicit.
    npar: usize,
    insts: Vec<Inst>,
    /// Facts about the most recently parsed sub-expression.
    flags: u8,
}

impl Compiler {
    /// Parses an alternation: the pattern body, or the inside of a
    /// parenthesized group (the caller consumes the opening parenthesis).
    ///
    /// All branches are linked to a common terminator node, so the first
    /// branch whose suffix completes wins.
    fn expression(&mut self, paren: bool) -> Result<InstPtr, Error> {
        let mut net = HAS_WIDTH;

        let mut parno = 0;
        let open = if paren {
            parno = self.npar;
            self.npar += 1;
            if self.npar >= MAX_GROUPS {
                return Err(Error::new(ERR_TOO_MANY_GROUPS));
            }
            Some(self.emit(Op::Open(parno as u32)))
        } else {
            None
        };

        let br = self.branch()?;
        let ret = match open {
            Some(open) => {
                self.tail(open, br);
                open
            }
            None => br,
        };
        if self.flags & HAS_WIDTH == 0 {
            net &= !HAS_WIDTH;
        }
        while self.peek() == Some('|') {
            self.off += 1;
            let br = self.branch()?;
            self.tail(ret, br);
            if self.flags & HAS_WIDTH == 0 {
                net &= !HAS_WIDTH;
            }
        }

        // Make the closing node and hook every branch chain onto it.
        let ender = self.emit(if paren {
            Op::Close(parno as u32)
        } else {
            Op::End
        });
        self.tail(ret, ender);
        let mut br = Some(ret);
        while let Some(pc) = br {
            self.optail(pc, ender);
            br = resolve_next(&self.insts, pc);
        }

        if paren {
            if self.peek() == Some(')') {
                self.off += 1;
            } else {
                return Err(Error::new(ERR_UNCLOSED_GROUP));
            }
        } else if self.off < self.chars.len() {
            // Only a stray ')' can stop the parse short of the end.
            return Err(Error::new(ERR_UNOPENED_GROUP));
        }

        self.flags = net;
        Ok(ret)
    }

    /// Parses one alternative: a concatenation of pieces.
    fn branch(&mut self) -> Result<InstPtr, Error> {
        let mut net = WORST;
        let ret = self.emit(Op::Branch);
        let mut chain = None;
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                Some(_) => {}
            }
            let latest = self.piece()?;
            net |= self.flags & HAS_WIDTH;
            if let Some(chain) = chain {
                self.tail(chain, latest);
            }
            chain = Some(latest);
        }
        if chain.is_none() {
            // An empty alternative matches the empty string.
            self.emit(Op::Nothing);
        }
        self.flags = net;
        Ok(ret)
    }

    /// Parses an atom with an optional `*`, `+` or `?` after it.
    ///
    /// The `?` and compound `*`/`+` lowerings reuse one NOTHING node as
    /// both the terminator of their branch list and the body of the empty
    /// alternative.
    fn piece(&mut self) -> Result<InstPtr, Error> {
        let ret = self.atom()?;
        let op = match self.peek() {
            Some(c) if is_repeat(c) => c,
            _ => return Ok(ret),
        };
        if self.flags & HAS_WIDTH == 0 && op != '?' {
            return Err(Error::new(ERR_EMPTY_REPEAT));
        }
        let flags = if op == '+' { HAS_WIDTH } else { WORST };
        let simple = self.flags & SIMPLE != 0;

        if op == '*' && simple {
            self.insert(Op::Star, ret);
        } else if op == '*' {
            // x* becomes (x and loop back | empty).
            self.insert(Op::Branch, ret);
            let back = self.emit(Op::Back);
            self.optail(ret, back);
            self.optail(ret, ret);
            let alt = self.emit(Op::Branch);
            self.tail(ret, alt);
            let nothing = self.emit(Op::Nothing);
            self.tail(ret, nothing);
        } else if op == '+' && simple {
            self.insert(Op::Plus, ret);
        } else if op == '+' {
            // x+ becomes x (loop back | empty).
            let alt = self.emit(Op::Branch);
            self.tail(ret, alt);
            let back = self.emit(Op::Back);
            self.tail(back, ret);
            let alt2 = self.emit(Op::Branch);
            self.tail(alt, alt2);
            let nothing = self.emit(Op::Nothing);
            self.tail(ret, nothing);
        } else {
            // x? becomes (x | empty).
            self.insert(Op::Branch, ret);
            let alt = self.emit(Op::Branch);
            self.tail(ret, alt);
            let nothing = self.emit(Op::Nothing);
            self.tail(ret, nothing);
            self.optail(ret, nothing);
        }

        self.off += 1;
        if let Some(c) = self.peek() {
            if is_repeat(c) {
                return Err(Error::new(ERR_NESTED_REPEAT));
            }
        }
        self.flags = flags;
        Ok(ret)
    }

    /// Parses the lowest level: a single node.
    ///
    /// A whole run of ordinary characters is gobbled into one node, backed
    /// off by one character when the last of the run turns out to be a
    /// quantifier operand.
    fn atom(&mut self) -> Result<InstPtr, Error> {
        let mut flags = WORST;
        let c = self.chars[self.off];
        self.off += 1;
        let ret = match c {
            '^' => self.emit(Op::Bol),
            '$' => self.emit(Op::Eol),
            '.' => {
                flags |= HAS_WIDTH | SIMPLE;
                self.emit(Op::Any)
            }
            '[' => {
                flags |= HAS_WIDTH | SIMPLE;
                self.bracket()?
            }
            '(' => {
                let ret = self.expression(true)?;
                flags |= self.flags & HAS_WIDTH;
                ret
            }
            '?' | '+' | '*' => return Err(Error::new(ERR_DANGLING_REPEAT)),
            '\\' => {
                let lit = match self.peek() {
                    Some(c) => c,
                    None => return Err(Error::new(ERR_TRAILING_ESCAPE)),
                };
                self.off += 1;
                flags |= HAS_WIDTH | SIMPLE;
                self.emit(Op::Exactly(lit.to_string().into_boxed_str()))
            }
            // The branch level stops before '|' and ')'.
            '|' | ')' => unreachable!("alternation delimiters are consumed by the caller"),
            _ => {
                self.off -= 1;
                let mut end = self.off;
                while end < self.chars.len() && !META.contains(self.chars[end]) {
                    end += 1;
                }
                if end > self.off + 1 && end < self.chars.len() && is_repeat(self.chars[end]) {
                    // Leave the last character to be the quantifier operand.
                    end -= 1;
                }
                flags |= HAS_WIDTH;
                if end == self.off + 1 {
                    flags |= SIMPLE;
                }
                let lit: String = self.chars[self.off..end].iter().collect();
                self.off = end;
                self.emit(Op::Exactly(lit.into_boxed_str()))
            }
        };
        self.flags = flags;
        Ok(ret)
    }

    /// Parses a bracket expression; the opening `[` is already consumed.
    ///
    /// A `]` or `-` directly after the opening bracket (or the negating
    /// `^`) is a literal member, as is a `-` directly before the closing
    /// bracket. Ranges expand into the membership set one character at a
    /// time.
    fn bracket(&mut self) -> Result<InstPtr, Error> {
        let negate = self.peek() == Some('^');
        if negate {
            self.off += 1;
        }
        let mut set = ClassBits::new();
        match self.peek() {
            Some(c) if c == ']' || c == '-' => {
                set.insert(c);
                self.off += 1;
            }
            _ => {}
        }
        loop {
            let c = match self.peek() {
                Some(c) => c,
                None => return Err(Error::new(ERR_UNCLOSED_CLASS)),
            };
            if c == ']' {
                break;
            }
            if c == '-' {
                self.off += 1;
                match self.peek() {
                    None => return Err(Error::new(ERR_UNCLOSED_CLASS)),
                    Some(']') => set.insert('-'),
                    Some(end) => {
                        // The range start is the previous member, already
                        // inserted on the last trip around the loop.
                        let start = self.chars[self.off - 2];
                        self.off += 1;
                        if start > end {
                            return Err(Error::new(ERR_INVALID_CLASS_RANGE));
                        }
                        for cp in (start as u32 + 1)..=(end as u32) {
                            if let Some(c) = char::from_u32(cp) {
                                set.insert(c);
                            }
                        }
                    }
                }
            } else {
                set.insert(c);
                self.off += 1;
            }
        }
        self.off += 1;
        Ok(self.emit(if negate {
            Op::AnyBut(set)
        } else {
            Op::AnyOf(set)
        }))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.off).copied()
    }

    /// Emits one node with an unset next link.
    fn emit(&mut self, op: Op) -> InstPtr {
        self.insts.push(Inst { op, next: 0 });
        self.insts.len() - 1
    }

    /// Inserts an operator in front of an already-emitted operand.
    ///
    /// Inserting shifts everything from `pc` on by one slot; the links are
    /// relative, and nothing links across `pc` at the points where this is
    /// used, so no patching is needed.
    fn insert(&mut self, op: Op, pc: InstPtr) {
        self.insts.insert(pc, Inst { op, next: 0 });
    }

    /// Sets the next link of the last node in the chain starting at `pc`.
    fn tail(&mut self, pc: InstPtr, target: InstPtr) {
        let mut last = pc;
        while let Some(next) = resolve_next(&self.insts, last) {
            last = next;
        }
        let disp = if let Op::Back = self.insts[last].op {
            last - target
        } else {
            target - last
        };
        self.insts[last].next = disp as u32;
    }

    /// `tail` on the operand chain of a branch node; no-op for anything
    /// else.
    fn optail(&mut self, pc: InstPtr, target: InstPtr) {
        if let Op::Branch = self.insts[pc].op {
            self.tail(pc + 1, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_star_program() {
        let prog = compile("a*b", false).unwrap();
        assert_eq!(
            "  0: BRANCH +4,4\n\
             \x20 1: STAR +2,3\n\
             \x20 2: EXACTLY 'a'\n\
             \x20 3: EXACTLY +1,4 'b'\n\
             \x20 4: END\n",
            prog.to_string()
        );
    }

    #[test]
    fn alternation_links_to_common_terminator() {
        let prog = compile("a|b", false).unwrap();
        assert_eq!(
            "  0: BRANCH +2,2\n\
             \x20 1: EXACTLY +3,4 'a'\n\
             \x20 2: BRANCH +2,4\n\
             \x20 3: EXACTLY +1,4 'b'\n\
             \x20 4: END\n",
            prog.to_string()
        );
    }

    #[test]
    fn group_wraps_open_close() {
        let prog = compile("(a)", false).unwrap();
        assert_eq!(
            "  0: BRANCH +5,5\n\
             \x20 1: OPEN1 +1,2\n\
             \x20 2: BRANCH +2,4\n\
             \x20 3: EXACTLY +1,4 'a'\n\
             \x20 4: CLOSE1 +1,5\n\
             \x20 5: END\n",
            prog.to_string()
        );
        assert_eq!(2, prog.npar);
    }

    #[test]
    fn compound_star_loops_back() {
        let prog = compile("(ab)*", false).unwrap();
        assert!(matches!(prog.insts[1].op, Op::Branch));
        assert!(prog.insts.iter().any(|inst| matches!(inst.op, Op::Back)));
    }

    #[test]
    fn anchoring_and_start_char_detection() {
        assert!(compile("^ab", false).unwrap().anchored);
        assert!(!compile("ab", false).unwrap().anchored);
        assert_eq!(Some('a'), compile("ab+", false).unwrap().start_char);
        assert_eq!(None, compile("a|b", false).unwrap().start_char);
        assert_eq!(None, compile("^ab", false).unwrap().start_char);
    }

    #[test]
    fn ignore_case_folds_the_pattern() {
        let prog = compile("AB[C-E]", true).unwrap();
        assert!(prog.ignore_case);
        assert_eq!(Some('a'), prog.start_char);
        match &prog.insts[1].op {
            Op::Exactly(lit) => assert_eq!("ab", &**lit),
            op => panic!("unexpected op {:?}", op),
        }
        match &prog.insts[2].op {
            Op::AnyOf(set) => {
                assert!(set.contains('c') && set.contains('e'));
                assert!(!set.contains('C'));
            }
            op => panic!("unexpected op {:?}", op),
        }
    }

    #[test]
    fn literal_run_backs_off_before_quantifier() {
        let prog = compile("abc*", false).unwrap();
        match &prog.insts[1].op {
            Op::Exactly(lit) => assert_eq!("ab", &**lit),
            op => panic!("unexpected op {:?}", op),
        }
        assert!(matches!(prog.insts[2].op, Op::Star));
        match &prog.insts[3].op {
            Op::Exactly(lit) => assert_eq!("c", &**lit),
            op => panic!("unexpected op {:?}", op),
        }
    }

    #[test]
    fn bracket_quirks() {
        let prog = compile("[]a]", false).unwrap();
        match &prog.insts[1].op {
            Op::AnyOf(set) => assert!(set.contains(']') && set.contains('a')),
            op => panic!("unexpected op {:?}", op),
        }
        let prog = compile("[a-]", false).unwrap();
        match &prog.insts[1].op {
            Op::AnyOf(set) => assert!(set.contains('a') && set.contains('-')),
            op => panic!("unexpected op {:?}", op),
        }
        let prog = compile("[^ab]", false).unwrap();
        assert!(matches!(prog.insts[1].op, Op::AnyBut(_)));
        let prog = compile("[a-cx]", false).unwrap();
        match &prog.insts[1].op {
            Op::AnyOf(set) => {
                for c in ['a', 'b', 'c', 'x'] {
                    assert!(set.contains(c));
                }
                assert!(!set.contains('d'));
            }
            op => panic!("unexpected op {:?}", op),
        }
    }

    #[test]
    fn rejects_malformed_patterns() {
        let err = |pattern| compile(pattern, false).unwrap_err().to_string();
        assert_eq!(ERR_UNCLOSED_GROUP, err("(a"));
        assert_eq!(ERR_UNOPENED_GROUP, err("a)"));
        assert_eq!(ERR_NESTED_REPEAT, err("a**"));
        assert_eq!(ERR_DANGLING_REPEAT, err("*a"));
        assert_eq!(ERR_EMPTY_REPEAT, err("(a*)*"));
        assert_eq!(ERR_EMPTY_REPEAT, err("(a|)+"));
        assert_eq!(ERR_UNCLOSED_CLASS, err("[a-"));
        assert_eq!(ERR_UNCLOSED_CLASS, err("[abc"));
        assert_eq!(ERR_INVALID_CLASS_RANGE, err("[c-a]"));
        assert_eq!(ERR_TRAILING_ESCAPE, err("a\\"));
        assert_eq!(ERR_TOO_MANY_GROUPS, err(&"(a)".repeat(99)));
    }

    #[test]
    fn group_count_stops_just_below_the_cap() {
        assert!(compile(&"(a)".repeat(98), false).is_ok());
    }

    #[test]
    fn optional_zero_width_atom_is_allowed() {
        assert!(compile("^?a", false).is_ok());
        assert!(compile("(a*)?", false).is_ok());
    }
}
