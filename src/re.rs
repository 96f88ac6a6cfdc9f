use std::fmt;
use std::str::FromStr;

use crate::compile::compile;
use crate::error::Error;
use crate::exec::{exec, span};
use crate::prog::Program;
use crate::subst::{apply_template, Substitutions};

/// A compiled regular expression.
///
/// A `Regexp` is built once from a pattern and can then be used any number
/// of times to match, query capture groups, or substitute. Compilation is
/// the expensive step; callers should compile once and reuse the value.
/// A compiled expression is immutable and can be shared freely between
/// threads.
///
/// All offsets reported by the matching methods are byte offsets into the
/// subject, always on character boundaries, with the end exclusive.
///
/// # Example
///
/// ```
/// use regexp_lite::Regexp;
///
/// let re = Regexp::new("([0-9]+)-([0-9]+)").unwrap();
/// let mut groups = vec![None; re.group_count()];
/// assert!(re.match_substrings("call 555-0199", &mut groups));
/// assert_eq!(Some("555"), groups[1].as_deref());
/// assert_eq!(Some("0199"), groups[2].as_deref());
/// ```
#[derive(Clone)]
pub struct Regexp {
    prog: Program,
    pattern: String,
}

impl Regexp {
    /// Compiles a pattern into a case-sensitive `Regexp`.
    ///
    /// # Errors
    ///
    /// Returns an error describing the problem when the pattern is
    /// malformed. A failed compile never yields a partially usable value.
    pub fn new(pattern: &str) -> Result<Regexp, Error> {
        RegexpBuilder::new(pattern).build()
    }

    /// Returns the pattern this expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns the number of capture groups, counting group 0, which spans
    /// the whole match.
    pub fn group_count(&self) -> usize {
        self.prog.npar
    }

    /// Returns whether the pattern can only match at the start of a
    /// subject.
    pub fn is_anchored(&self) -> bool {
        self.prog.anchored
    }

    /// Returns the character every match is known to start with, if there
    /// is one.
    pub fn start_char(&self) -> Option<char> {
        self.prog.start_char
    }

    /// Returns the compiled instruction program. Its `Display`
    /// implementation renders the symbolic dump.
    pub fn program(&self) -> &Program {
        &self.prog
    }

    /// Returns true if and only if the subject contains a match.
    pub fn is_match(&self, text: &str) -> bool {
        exec(&self.prog, text, 0).is_some()
    }

    /// Returns the substring spanned by the leftmost match, or `None` when
    /// there is no match.
    pub fn find(&self, text: &str) -> Option<String> {
        let slots = exec(&self.prog, text, 0)?;
        span(&slots, 0).map(|(start, end)| text[start..end].to_string())
    }

    /// Matches against `text` and fills `substrs` with the text captured
    /// by each group, `None` for groups that did not participate.
    ///
    /// Entry 0 is the whole match. A slice shorter than
    /// [`group_count`](Regexp::group_count) receives only as many entries
    /// as it has room for; a longer one has the remainder cleared to
    /// `None`. On `false` the slice is left untouched.
    pub fn match_substrings(&self, text: &str, substrs: &mut [Option<String>]) -> bool {
        let slots = match exec(&self.prog, text, 0) {
            Some(slots) => slots,
            None => return false,
        };
        let max = substrs.len().min(self.prog.npar);
        for group in 0..max {
            substrs[group] = span(&slots, group).map(|(start, end)| text[start..end].to_string());
        }
        for entry in substrs[max..].iter_mut() {
            *entry = None;
        }
        true
    }

    /// Like [`match_substrings`](Regexp::match_substrings), but fills
    /// `indices` with raw start/end offset pairs, `-1` for groups that did
    /// not participate.
    pub fn match_indices(&self, text: &str, indices: &mut [isize]) -> bool {
        let slots = match exec(&self.prog, text, 0) {
            Some(slots) => slots,
            None => return false,
        };
        let max = indices.len().min(2 * self.prog.npar);
        for (entry, slot) in indices[..max].iter_mut().zip(slots.iter()) {
            *entry = slot.map_or(-1, |off| off as isize);
        }
        for entry in indices[max..].iter_mut() {
            *entry = -1;
        }
        true
    }

    /// Replaces the leftmost match with the rendering of `template` and
    /// returns the resulting string, or `None` when there is no match.
    ///
    /// In a template, `&` expands to the whole match and `\N` to the text
    /// of capture group `N` (empty when the group did not participate).
    /// Any other backslash-escaped character is that character literally.
    ///
    /// # Example
    ///
    /// ```
    /// use regexp_lite::Regexp;
    ///
    /// let re = Regexp::new("([a-z]+)=([0-9]+)").unwrap();
    /// assert_eq!(
    ///     Some("port <- 80; host=x".to_string()),
    ///     re.replace_first("port=80; host=x", "\\1 <- \\2"),
    /// );
    /// ```
    pub fn replace_first(&self, text: &str, template: &str) -> Option<String> {
        let mut subs = Substitutions::new(self, text);
        if !subs.next_match() {
            return None;
        }
        let mut out = String::with_capacity(text.len());
        out.push_str(subs.skipped());
        apply_template(&subs, template, &mut out);
        out.push_str(subs.rest());
        Some(out)
    }

    /// Replaces every non-overlapping match with the rendering of
    /// `template`. Already-substituted output is never rescanned. Returns
    /// the subject unchanged when there is no match at all.
    pub fn replace_all(&self, text: &str, template: &str) -> String {
        self.replace_with(text, |subs, out| {
            apply_template(subs, template, out);
            true
        })
    }

    /// Replaces matches under the control of `filter`.
    ///
    /// For each match, the text skipped since the previous match is
    /// appended to the output, then `filter` is called with the cursor and
    /// the output buffer to append whatever replacement it wants; it
    /// returns whether to keep going. The tail after the last handled
    /// match is appended at the end. Returns the subject unchanged when
    /// there is no match at all.
    pub fn replace_with<F>(&self, text: &str, mut filter: F) -> String
    where
        F: FnMut(&Substitutions, &mut String) -> bool,
    {
        let mut subs = Substitutions::new(self, text);
        if !subs.next_match() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        loop {
            out.push_str(subs.skipped());
            if !filter(&subs, &mut out) {
                break;
            }
            if !subs.next_match() {
                break;
            }
        }
        out.push_str(subs.rest());
        out
    }
}

impl fmt::Display for Regexp {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl fmt::Debug for Regexp {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Regexp").field(&self.pattern).finish()
    }
}

impl FromStr for Regexp {
    type Err = Error;

    /// Attempts to compile a string as a case-sensitive pattern.
    fn from_str(pattern: &str) -> Result<Regexp, Error> {
        Regexp::new(pattern)
    }
}

/// A configurable builder for a [`Regexp`].
///
/// ```
/// use regexp_lite::RegexpBuilder;
///
/// let re = RegexpBuilder::new("end[.!]")
///     .case_insensitive(true)
///     .build()
///     .unwrap();
/// assert!(re.is_match("THE END!"));
/// ```
#[derive(Clone, Debug)]
pub struct RegexpBuilder {
    pattern: String,
    case_insensitive: bool,
}

impl RegexpBuilder {
    /// Creates a builder for the given pattern with default options.
    pub fn new(pattern: &str) -> RegexpBuilder {
        RegexpBuilder {
            pattern: pattern.to_string(),
            case_insensitive: false,
        }
    }

    /// Sets whether matching should be case-insensitive. When enabled the
    /// pattern is lower-cased before compilation and subject characters
    /// are folded during matching.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut RegexpBuilder {
        self.case_insensitive = yes;
        self
    }

    /// Compiles the pattern with the configured options.
    pub fn build(&self) -> Result<Regexp, Error> {
        let prog = compile(&self.pattern, self.case_insensitive)?;
        Ok(Regexp {
            prog,
            pattern: self.pattern.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_case_insensitive() {
        let re = RegexpBuilder::new("abc")
            .case_insensitive(true)
            .build()
            .unwrap();
        assert!(re.is_match("xAbCx"));
        assert!(!Regexp::new("abc").unwrap().is_match("xAbCx"));
    }

    #[test]
    fn display_and_debug_show_the_pattern() {
        let re = Regexp::new("a(b)c").unwrap();
        assert_eq!("a(b)c", re.to_string());
        assert_eq!("a(b)c", re.as_str());
        assert_eq!("Regexp(\"a(b)c\")", format!("{:?}", re));
    }

    #[test]
    fn from_str_compiles() {
        let re: Regexp = "ab".parse().unwrap();
        assert!(re.is_match("drab"));
        assert!("a(".parse::<Regexp>().is_err());
    }

    #[test]
    fn find_returns_the_matched_text() {
        let re = Regexp::new("[0-9]+").unwrap();
        assert_eq!(Some("123".to_string()), re.find("ab123cd456"));
        assert_eq!(None, re.find("abcd"));
    }
}
