// Macros for writing match assertions.
//
// mat! asserts that the pattern matches and that every capture group,
// starting with group 0 (the whole match), captured the expected text.
// nomat! asserts that the pattern does not match at all.

macro_rules! mat {
    ($name:ident, $re:expr, $text:expr, $($group:expr),+ $(,)?) => {
        #[test]
        fn $name() {
            let re = regexp_lite::Regexp::new($re).unwrap();
            let mut groups = vec![None; re.group_count()];
            assert!(
                re.match_substrings($text, &mut groups),
                "expected {:?} to match {:?}",
                $re,
                $text
            );
            let got: Vec<Option<&str>> = groups.iter().map(|g| g.as_deref()).collect();
            let expected: Vec<Option<&str>> = vec![$($group),+];
            assert_eq!(
                expected, got,
                "wrong captures for {:?} on {:?}",
                $re, $text
            );
        }
    };
}

macro_rules! nomat {
    ($name:ident, $re:expr, $text:expr) => {
        #[test]
        fn $name() {
            let re = regexp_lite::Regexp::new($re).unwrap();
            assert!(
                !re.is_match($text),
                "expected {:?} not to match {:?}",
                $re,
                $text
            );
        }
    };
}
