/*! End-to-end tests. */
use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::{
    compile, glob_to_pattern, Error, MatchError, MatchFlagSet, MatchFlags,
    Program, ReaderInput, Regex, ReplaceFlagSet, ReplaceFlags, SyntaxError,
};

macro_rules! pattern_match {
    ($pattern:literal, $data:expr, $expected_result:expr) => {{
        let re = Regex::new($pattern).unwrap();
        let captures = re.captures($data).unwrap_or_else(|| {
            panic!("pattern `{}` should match `{:?}`", $pattern, $data)
        });

        assert_eq!(
            captures.as_str(),
            $expected_result,
            "\n\n`{}` applied to `{:?}` should match `{:?}`, but it is matching `{:?}`",
            $pattern,
            $data,
            $expected_result,
            captures.as_str()
        );
    }};
}

macro_rules! pattern_false {
    ($pattern:literal, $data:expr) => {{
        let re = Regex::new($pattern).unwrap();
        assert!(
            !re.is_match($data),
            "\n\n`{}` should not match `{:?}`",
            $pattern,
            $data
        );
    }};
}

#[test]
fn regexp_patterns_1() {
    pattern_match!("abc", "abc", "abc");
    pattern_false!("abc", "xbc");
    pattern_match!("abc", "xabcx", "abc");
    pattern_match!("abc", "ababc", "abc");
    pattern_match!("a.c", "abc", "abc");
    pattern_match!("ab*c", "abc", "abc");
    pattern_match!("ab*c", "ac", "ac");
    pattern_match!("ab*bc", "abc", "abc");
    pattern_match!("ab*bc", "abbc", "abbc");
    pattern_match!("a.*bb", "abbbb", "abbbb");
    pattern_match!("a.*?bbb", "abbbbbb", "abbb");
    pattern_match!("a.*c", "ac", "ac");
    pattern_match!("a.*c", "axyzc", "axyzc");
    pattern_match!("ab+c", "abbc", "abbc");
    pattern_false!("ab+c", "ac");
    pattern_match!("ab+", "abbbb", "abbbb");
    pattern_match!("ab+?", "abbbb", "ab");
    pattern_false!("ab+bc", "abc");
    pattern_false!("ab+bc", "abq");
    pattern_match!("a+b+c", "aabbabc", "abc");
    pattern_false!("ab?bc", "abbbbc");
    pattern_match!("ab?c", "abc", "abc");
    pattern_match!("ab?c", "ac", "ac");
    pattern_match!("ab*?", "abbb", "a");
    pattern_match!("ab??", "ab", "a");
    pattern_match!("a(b|x)c", "abc", "abc");
    pattern_match!("a(b|x)c", "axc", "axc");
    pattern_match!("a(b|.)c", "axc", "axc");
    pattern_match!("(a|b)*c|(a|ab)*c", "abc", "abc");
    pattern_match!("(foo|foobar)baz", "foobarbaz", "foobarbaz");
    pattern_match!("a[bc]d", "abd", "abd");
    pattern_false!("a[b-d]e", "abd");
    pattern_match!("a[b-d]e", "ace", "ace");
    pattern_match!("a[^bc]d", "aed", "aed");
    pattern_false!("a[^bc]d", "abd");
    pattern_match!("a[^-b]c", "adc", "adc");
}

#[test]
fn regexp_patterns_2() {
    pattern_match!(".b{2}", "abb", "abb");
    pattern_match!(".b{2,3}", "abb", "abb");
    pattern_match!(".b{2,3}", "abbb", "abbb");
    pattern_match!(".b{2,3}?", "abbb", "abb");
    pattern_match!("ab{2,3}?c", "abbbc", "abbbc");
    pattern_match!(".b{2,3}cccc", "abbbcccc", "abbbcccc");
    pattern_match!(".b{2,3}?cccc", "abbbcccc", "abbbcccc");
    pattern_match!("ab{0,1}?c", "abc", "abc");
    pattern_match!("a{0,1}bc", "bbc", "bc");
    pattern_match!("ab{0,}c", "ac", "ac");
    pattern_match!("ab{0,}c", "abbbc", "abbbc");
    pattern_match!("a{0,1}?bc", "abc", "abc");
    pattern_match!("a{0,1}?bc", "bc", "bc");
    pattern_match!("ab{1}c", "abc", "abc");
    pattern_false!("ab{1}c", "abbc");
    pattern_false!("ab{1}c", "ac");
    pattern_match!("ab{1,2}c", "abbc", "abbc");
    pattern_false!("ab{1,2}c", "abbbc");
    pattern_match!("ab{1,}c", "abbbc", "abbbc");
    pattern_match!("ab{4,}c", "abbbbc", "abbbbc");
    pattern_false!("ab{4,}c", "abbbc");
    pattern_match!("ab{0}c", "ac", "ac");
    pattern_match!(r"\d{3}-\d{4}", "call 555-1234", "555-1234");
    pattern_match!("(ab|cd){2}", "xabcdab", "abcd");
}

#[test]
fn regexp_escapes() {
    pattern_match!(r"\x41é", "xAé", "Aé");
    pattern_match!(r"\t", "a\tb", "\t");
    pattern_match!(r"a\.b", "axb a.b", "a.b");
    pattern_match!(r"\(\)", "f()", "()");
    pattern_match!(r"\101\x42", "xAB", "AB");
    pattern_match!(r"\w+\s\w+", "¡hola mundo!", "hola mundo");
    pattern_match!(r"\bis\b", "this is it", "is");
    pattern_match!(r"\Bis", "this is it", "is");
}

#[test]
fn regexp_backreferences() {
    pattern_match!(r"(a+)\1", "aaaa", "aaaa");
    pattern_match!(r"(a+)\1", "aaa", "aa");
    pattern_false!(r"^(a+)\1$", "aaa");
    pattern_match!(r"([a-c])x\1", "axbbxb", "bxb");
    pattern_match!(r"(\w+) \1", "hello hello world", "hello hello");
    pattern_false!(r"(\w+) \1", "hello world");
}

#[test]
fn anchors_and_flags() {
    pattern_match!("^abc$", "abc", "abc");
    pattern_false!("^abc$", "abcc");
    pattern_false!("^abc$", "x\nabc");

    let mut flags = MatchFlagSet::none();
    flags.set(MatchFlags::Multiline);

    let re = Regex::with_flags("^abc$", flags).unwrap();
    assert!(re.is_match("x\nabc\ny"));

    let mut re = Regex::new("ABC").unwrap();
    assert!(!re.is_match("abc"));

    re.set_flags(MatchFlagSet::from(MatchFlags::CaseInsensitive));
    assert!(re.is_match("abc"));
    assert!(re.flags().contains(MatchFlags::CaseInsensitive));
}

#[test]
fn captures() {
    let re = Regex::new(r"é(.)").unwrap();
    let caps = re.captures("aéb").unwrap();

    assert_eq!(caps.len(), 2);
    assert_eq!(caps.span(0), Some((1, 3)));
    assert_eq!(caps.byte_span(0), Some((1, 4)));
    assert_eq!(caps.get(0), Some("éb"));
    assert_eq!(caps.span(1), Some((2, 3)));
    assert_eq!(caps.byte_span(1), Some((3, 4)));
    assert_eq!(caps.get(1), Some("b"));
    assert_eq!(caps.get(2), None);

    let re = Regex::new("(a)|(b)").unwrap();
    let caps = re.captures("b").unwrap();

    assert_eq!(caps.get(1), None);
    assert_eq!(caps.get(2), Some("b"));

    let re = Regex::new(r"\d+").unwrap();

    assert_eq!(re.captures_at("12 34", 1).unwrap().as_str(), "2");
    assert_eq!(re.captures_at("12 34", 2).unwrap().as_str(), "34");
    assert!(re.captures_at("12 34", 6).is_none());
    assert!(re.captures("none").is_none());

    assert!(re.is_match_at("12 34", 3));
    assert!(!re.is_match_at("12 ab", 2));
}

#[test]
fn find_in_reader() {
    let re = Regex::new("w(or)ld").unwrap();
    let input = ReaderInput::new("hello world".as_bytes());
    let result = re.find_in(&input, 0).unwrap();

    assert_eq!(result.group_count(), 2);
    assert_eq!(result.start(), 6);
    assert_eq!(result.end(), 11);
    assert_eq!(result.group(1), Some((7, 9)));

    let chars: Vec<char> = "hello".chars().collect();
    assert!(re.find_in(&chars, 0).is_none());
}

#[test]
fn subst() {
    let none = ReplaceFlagSet::none();

    let re = Regex::new("a*").unwrap();
    assert_eq!(re.subst("bb", "X", none), "XbXbX");
    assert_eq!(re.subst("", "X", none), "X");
    assert_eq!(re.subst("aa", "X", none), "XX");

    let re = Regex::new("o").unwrap();
    assert_eq!(re.subst("foo", "0", none), "f00");
    assert_eq!(re.subst("foo", "0", ReplaceFlags::FirstOnly.into()), "f0o");
    assert_eq!(re.subst("bar", "0", none), "bar");

    let re = Regex::new(r"(\w+)=(\w+)").unwrap();
    let backrefs = ReplaceFlagSet::from(ReplaceFlags::Backreferences);

    assert_eq!(re.subst("a=1 b=2", "$2=$1", backrefs), "1=a 2=b");
    assert_eq!(re.subst("a=1 b=2", "$2=$1", none), "$2=$1 $2=$1");
    assert_eq!(re.subst("a=1", "[$0]", backrefs), "[a=1]");
    assert_eq!(re.subst("a=1", "$9$x", backrefs), "$x");
    assert_eq!(re.subst("a=1", r"\$1", backrefs), "$1");

    let re = Regex::new("(a)|b").unwrap();
    assert_eq!(re.subst("ab", "[$1]", backrefs), "[a][]");

    let re = Regex::new(r"\d").unwrap();
    let flags = ReplaceFlags::FirstOnly | ReplaceFlags::Backreferences;
    assert_eq!(re.subst("1ñ2ñ3", "#", flags), "#ñ2ñ3");
}

#[test]
fn split() {
    let re = Regex::new("[ab]+").unwrap();
    assert_eq!(re.split("ab12ba34"), vec!["", "12", "34"]);

    let re = Regex::new(",").unwrap();
    assert_eq!(re.split("a,b,,c"), vec!["a", "b", "", "c"]);
    assert_eq!(re.split("a,b,"), vec!["a", "b"]);
    assert_eq!(re.split("abc"), vec!["abc"]);
    assert_eq!(re.split(""), Vec::<&str>::new());

    let re = Regex::new("x*").unwrap();
    assert_eq!(re.split("añb"), vec!["a", "ñ", "b"]);
}

#[test]
fn grep() {
    let re = Regex::new("^b").unwrap();

    assert_eq!(
        re.grep(["apple", "banana", "blue", "cherry"]),
        vec!["banana", "blue"]
    );

    let lines = vec!["one", "two", "three"];
    let re = Regex::new("o").unwrap();

    assert_eq!(re.grep(lines.iter().copied()), vec!["one", "two"]);
}

#[test]
fn glob() {
    assert_eq!(glob_to_pattern("*.rs"), r".*\.rs");
    assert_eq!(glob_to_pattern("a+b?"), r"a\+b\?");
    assert_eq!(glob_to_pattern("[x]{1}"), r"\[x\]\{1\}");

    let re = Regex::new(&glob_to_pattern("^*$")).unwrap();
    assert!(re.is_match("x^foo$"));
    assert!(!re.is_match("foo$"));
}

#[test]
fn step_limit() {
    let input = "a".repeat(30);

    let re = Regex::new("(a|a)*b").unwrap().step_limit(10_000);
    assert!(!re.is_match(&input));
    assert!(re.is_match("aab"));

    let re = Regex::new("a*").unwrap().depth_limit(10);
    assert!(re.is_match("aaa"));
    assert!(!re.is_match(&input));
}

#[test]
fn limit_exceeded() {
    let re = Regex::new("(a|a)*b").unwrap().step_limit(10_000);
    let input = format!("aab {}", "a".repeat(30));

    assert_eq!(re.try_is_match("aab"), Ok(true));
    assert_eq!(re.try_is_match("ccc"), Ok(false));
    assert_eq!(re.try_is_match(&input[4..]), Err(MatchError::LimitExceeded));
    assert!(re.try_captures("aab").unwrap().is_some());
    assert!(re.try_captures(&input[4..]).is_err());

    // The first match is replaced, then the search is aborted.
    assert_eq!(
        re.subst(&input, "X", ReplaceFlagSet::none()),
        format!("X {}", "a".repeat(30))
    );
    assert_eq!(
        re.try_subst(&input, "X", ReplaceFlagSet::none()),
        Err(MatchError::LimitExceeded)
    );
    assert_eq!(re.try_subst("aab", "X", ReplaceFlagSet::none()).unwrap(), "X");

    assert_eq!(re.split(&input), vec!["", &input[3..]]);
    assert_eq!(re.try_split(&input), Err(MatchError::LimitExceeded));
    assert_eq!(re.try_split("xaaby").unwrap(), vec!["x", "y"]);

    // Greedy loops recurse once per iteration, the depth limit turns a
    // long input into an error instead of a stack overflow.
    let re = Regex::new("a*").unwrap().depth_limit(200);
    let input = "a".repeat(100_000);

    assert_eq!(re.try_is_match(&input), Err(MatchError::LimitExceeded));
    assert_eq!(re.try_is_match("aaa"), Ok(true));
}

#[test]
fn serialized_programs() {
    let program = compile(r"(\w+)@(\w+)\.com").unwrap();
    let bytes = program.serialize().unwrap();
    let program = Program::deserialize(bytes).unwrap();

    let re = Regex::from_program(program, MatchFlagSet::none());
    let caps = re.captures("mail bob@example.com now").unwrap();

    assert_eq!(caps.get(1), Some("bob"));
    assert_eq!(caps.get(2), Some("example"));
}

#[test]
fn shared_among_threads() {
    let re = Arc::new(Regex::new(r"(\d+)-(\d+)").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let re = re.clone();
            std::thread::spawn(move || {
                let s = format!("range {}-{}", i, i * 10);
                let caps = re.captures(&s).unwrap();
                caps.get(2).map(|g| g.to_string())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some((i * 10).to_string()));
    }

    // Clones share the program.
    let clone = (*re).clone();
    assert!(std::ptr::eq(re.program(), clone.program()));
}

#[test]
fn errors() {
    assert_eq!(
        Regex::new("(a").err(),
        Some(Error::Syntax {
            error: SyntaxError::MissingCloseParen,
            position: 2
        })
    );

    assert_eq!(
        Regex::new("a**").unwrap_err().to_string(),
        "syntax error at position 2: missing operand to closure"
    );
}
