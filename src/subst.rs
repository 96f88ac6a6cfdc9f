use crate::exec::{exec, span, Slots};
use crate::re::Regexp;

/// A cursor over the successive non-overlapping matches of a pattern in
/// one subject, exposing the pieces substitution needs: the text skipped
/// since the previous match, the matched text, each capture group, and the
/// remaining tail.
///
/// The cursor only ever moves forward: every advance searches at or after
/// the end of the previous match, so substituted regions are never
/// rescanned. After a zero-length match the next search starts one
/// character later, which keeps advancing even for patterns that can match
/// the empty string.
///
/// ```
/// use regexp_lite::{Regexp, Substitutions};
///
/// let re = Regexp::new("[0-9]+").unwrap();
/// let mut subs = Substitutions::new(&re, "ab12cd34");
/// assert!(subs.next_match());
/// assert_eq!("ab", subs.skipped());
/// assert_eq!("12", subs.matched());
/// assert_eq!("cd34", subs.rest());
/// ```
#[derive(Debug)]
pub struct Substitutions<'r, 't> {
    re: &'r Regexp,
    text: &'t str,
    /// End of the match before the current one.
    prev_end: usize,
    /// Span of the current match.
    start: usize,
    end: usize,
    slots: Slots,
    found: bool,
}

impl<'r, 't> Substitutions<'r, 't> {
    /// Creates a cursor at the start of `text`, before any match.
    pub fn new(re: &'r Regexp, text: &'t str) -> Substitutions<'r, 't> {
        Substitutions {
            re,
            text,
            prev_end: 0,
            start: 0,
            end: 0,
            slots: Vec::new(),
            found: false,
        }
    }

    /// Advances to the next match and returns whether there was one.
    ///
    /// On failure the pieces of the last successful match stay available,
    /// so a caller can still append the final tail.
    pub fn next_match(&mut self) -> bool {
        let from = if !self.found {
            0
        } else if self.start == self.end {
            // The previous match was empty; force progress past it.
            match self.text.get(self.end..).and_then(|rest| rest.chars().next()) {
                Some(c) => self.end + c.len_utf8(),
                None => return false,
            }
        } else {
            self.end
        };
        let slots = match exec(self.re.program(), self.text, from) {
            Some(slots) => slots,
            None => return false,
        };
        let (start, end) = match span(&slots, 0) {
            Some(span) => span,
            None => return false,
        };
        self.prev_end = self.end;
        self.start = start;
        self.end = end;
        self.slots = slots;
        self.found = true;
        true
    }

    /// The subject text between the previous match (or the start of the
    /// subject) and the current match.
    pub fn skipped(&self) -> &'t str {
        &self.text[self.prev_end..self.start]
    }

    /// The text spanned by the current match.
    pub fn matched(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// The text captured by group `group` in the current match, or `None`
    /// when that group did not participate.
    pub fn submatch(&self, group: usize) -> Option<&'t str> {
        span(&self.slots, group).map(|(start, end)| &self.text[start..end])
    }

    /// The subject text after the current match.
    pub fn rest(&self) -> &'t str {
        &self.text[self.end..]
    }

    /// The number of capture groups of the underlying pattern, counting
    /// group 0.
    pub fn group_count(&self) -> usize {
        self.re.group_count()
    }
}

/// Renders a substitution template against the current match of `subs`,
/// appending to `out`.
///
/// `&` expands to the whole match and `\N` to the text of group `N`, empty
/// when the group did not participate. Any other escaped character passes
/// through literally. A trailing backslash, or a reference to a group the
/// pattern does not have, clamps the rendering at that point rather than
/// erroring.
pub(crate) fn apply_template(subs: &Substitutions, template: &str, out: &mut String) {
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str(subs.matched()),
            '\\' => {
                let escaped = match chars.next() {
                    Some(c) => c,
                    None => return,
                };
                match escaped.to_digit(10) {
                    Some(group) => {
                        let group = group as usize;
                        if group >= subs.group_count() {
                            return;
                        }
                        if let Some(text) = subs.submatch(group) {
                            out.push_str(text);
                        }
                    }
                    None => out.push(escaped),
                }
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_every_match_forward() {
        let re = Regexp::new("a+").unwrap();
        let mut subs = Substitutions::new(&re, "xaayaz");
        assert!(subs.next_match());
        assert_eq!(("x", "aa"), (subs.skipped(), subs.matched()));
        assert!(subs.next_match());
        assert_eq!(("y", "a"), (subs.skipped(), subs.matched()));
        assert_eq!("z", subs.rest());
        assert!(!subs.next_match());
        assert_eq!("z", subs.rest());
    }

    #[test]
    fn empty_matches_advance_one_character() {
        let re = Regexp::new("x*").unwrap();
        let mut subs = Substitutions::new(&re, "ab");
        let mut spans = Vec::new();
        while subs.next_match() {
            spans.push((subs.skipped().to_string(), subs.matched().to_string()));
        }
        assert_eq!(
            vec![
                ("".to_string(), "".to_string()),
                ("a".to_string(), "".to_string()),
                ("b".to_string(), "".to_string()),
            ],
            spans
        );
    }

    #[test]
    fn template_renders_groups_and_escapes() {
        let re = Regexp::new("(a+)(b+)").unwrap();
        let mut subs = Substitutions::new(&re, "xaabbby");
        assert!(subs.next_match());
        let mut out = String::new();
        apply_template(&subs, "<\\2\\&\\1>&", &mut out);
        assert_eq!("<bbb&aa>aabbb", out);
    }

    #[test]
    fn template_clamps_on_trailing_backslash() {
        let re = Regexp::new("a").unwrap();
        let mut subs = Substitutions::new(&re, "a");
        assert!(subs.next_match());
        let mut out = String::new();
        apply_template(&subs, "x\\", &mut out);
        assert_eq!("x", out);
    }

    #[test]
    fn template_clamps_on_unknown_group() {
        let re = Regexp::new("(a)").unwrap();
        let mut subs = Substitutions::new(&re, "a");
        assert!(subs.next_match());
        let mut out = String::new();
        apply_template(&subs, "<\\7>", &mut out);
        assert_eq!("<", out);
    }
}
