use quickcheck::{quickcheck, TestResult};
use regexp_lite::Regexp;

fn alnum(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

quickcheck! {
    // A pattern without metacharacters is plain substring search.
    fn literal_pattern_is_substring_search(needle: String, hay: String) -> TestResult {
        let needle = alnum(&needle);
        if needle.is_empty() || needle.len() > 8 {
            return TestResult::discard();
        }
        let hay = alnum(&hay);
        let re = Regexp::new(&needle).unwrap();
        TestResult::from_bool(re.is_match(&hay) == hay.contains(&needle))
    }

    // And when it matches, the matched text is the literal itself.
    fn literal_match_text_is_the_literal(needle: String, pad: String) -> TestResult {
        let needle = alnum(&needle);
        if needle.is_empty() || needle.len() > 8 {
            return TestResult::discard();
        }
        let hay = format!("{}{}{}", alnum(&pad), needle, alnum(&pad));
        let re = Regexp::new(&needle).unwrap();
        TestResult::from_bool(re.find(&hay).as_deref() == Some(needle.as_str()))
    }

    // Skipped text, matched text and the final tail partition the subject:
    // replacing every match with itself reproduces it exactly.
    fn identity_replacement_reconstructs(hay: String) -> bool {
        let re = Regexp::new("[0-9]+").unwrap();
        let out = re.replace_with(&hay, |subs, out| {
            out.push_str(subs.matched());
            true
        });
        out == hay
    }

    // The same accounting holds when zero-length matches are possible.
    fn reconstruction_with_empty_matches(hay: String) -> bool {
        let re = Regexp::new("a*").unwrap();
        let out = re.replace_with(&hay, |subs, out| {
            out.push_str(subs.matched());
            true
        });
        out == hay
    }
}
