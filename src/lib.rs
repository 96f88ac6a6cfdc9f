/*!
A small backtracking regular expression engine with capture groups and
Tcl-style substitution templates.

A pattern is compiled once into a compact instruction program; the program
is then executed by a backtracking virtual machine to find the leftmost
match in a subject string. A substitution layer iterates successive
non-overlapping matches to build replacement output, either from a
template or under the control of a caller-supplied filter.

# Syntax

The supported grammar is deliberately small:

* `.` matches any one character.
* `[abc]`, `[a-z]` and the negated `[^...]` match one character against a
  membership set; a `]` or `-` right after the opening bracket is literal.
* `*`, `+` and `?` are greedy repetition of the preceding piece.
* `|` separates alternatives, tried first to last.
* `( ... )` groups and captures; group 0 is the whole match.
* `^` and `$` anchor to the start and end of the subject (there are no
  per-line semantics).
* `\c` matches the character `c` literally.

# Example

```
use regexp_lite::Regexp;

let re = Regexp::new("([a-z]+)@([a-z]+)").unwrap();
assert_eq!(Some("ops@example".to_string()), re.find("mail to: ops@example"));
assert_eq!("mail to: <&>", re.replace_all("mail to: ops@example", "<\\&>"));
```

# Semantics

Matching is leftmost: the smallest start offset with any match wins, and at
that offset the first path found by the greedy, first-alternative-first
backtracking search is reported. That path is not necessarily the longest
possible match. Worst-case matching time is exponential for pathological
patterns; there is no backtracking budget.

A compiled [`Regexp`] is immutable. Every match runs with its own private
state, so one compiled value can be used from any number of threads at
once.
*/

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

#[cfg(feature = "logging")]
macro_rules! trace {
    ($($tt:tt)*) => { log::trace!($($tt)*) };
}
#[cfg(not(feature = "logging"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

pub use crate::error::Error;
pub use crate::prog::{ClassBits, Inst, InstPtr, Op, Program};
pub use crate::re::{Regexp, RegexpBuilder};
pub use crate::subst::Substitutions;

mod compile;
mod error;
mod exec;
mod prog;
mod re;
mod subst;
