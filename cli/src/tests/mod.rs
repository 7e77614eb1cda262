use assert_cmd::Command;
use predicates::prelude::*;

mod config;

const INPUT: &str = "abc\nxyz\nbcd\n";

#[test]
fn cli_match() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("b")
        .write_stdin(INPUT)
        .assert()
        .success()
        .stdout("abc\nbcd\n");
}

#[test]
fn cli_match_line_number() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("-n")
        .arg("b")
        .write_stdin(INPUT)
        .assert()
        .success()
        .stdout("1:abc\n3:bcd\n");
}

#[test]
fn cli_match_count() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("--count")
        .arg("b")
        .write_stdin(INPUT)
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn cli_match_case_insensitive() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("-i")
        .arg("^B")
        .write_stdin(INPUT)
        .assert()
        .success()
        .stdout("bcd\n");
}

#[test]
fn cli_match_file() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let input = temp_dir.path().join("input.txt");

    std::fs::write(&input, "foo\nbar\nbaz\n").unwrap();

    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("ba[rz]$")
        .arg(&input)
        .assert()
        .success()
        .stdout("bar\nbaz\n");

    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("foo")
        .arg(temp_dir.path().join("missing.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error: can not read"));
}

#[test]
fn cli_match_invalid_regexp() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("(")
        .write_stdin(INPUT)
        .assert()
        .failure()
        .code(1)
        .stderr(
            "error: invalid regexp `(`: syntax error at position 1: missing close paren\n",
        );
}

#[test]
fn cli_step_limit() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("--step-limit")
        .arg("1000")
        .arg("match")
        .arg("--count")
        .arg("(a|a)*b")
        .write_stdin(format!("aab\n{}\n", "a".repeat(30)))
        .assert()
        .failure()
        .code(1)
        .stderr(
            "error: can not search line 2: search aborted, step or depth \
             limit exceeded\n",
        );
}

#[test]
fn cli_depth_limit() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("--depth-limit")
        .arg("10")
        .arg("match")
        .arg("a*")
        .write_stdin("a".repeat(20))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("limit exceeded"));

    // The default limit aborts long matches before the stack overflows.
    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("--count")
        .arg("a*")
        .write_stdin("a".repeat(100_000))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("limit exceeded"));

    Command::cargo_bin("rx")
        .unwrap()
        .arg("match")
        .arg("--count")
        .arg("a*")
        .write_stdin("a".repeat(1_000))
        .assert()
        .success()
        .stdout("1\n");

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--depth-limit")
        .arg("10")
        .arg("split")
        .arg("a*")
        .write_stdin("a".repeat(20))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: can not split the input"));

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--depth-limit")
        .arg("10")
        .arg("subst")
        .arg("a*")
        .arg("x")
        .write_stdin("a".repeat(20))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with(
            "error: can not replace the matches",
        ));
}

#[test]
fn cli_subst() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("subst")
        .arg(r"(\w+)=(\w+)")
        .arg("$2=$1")
        .write_stdin("a=1 b=2\n")
        .assert()
        .success()
        .stdout("1=a 2=b\n");
}

#[test]
fn cli_subst_first() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("subst")
        .arg("--first")
        .arg(r"(\w+)=(\w+)")
        .arg("$2=$1")
        .write_stdin("a=1 b=2\n")
        .assert()
        .success()
        .stdout("1=a b=2\n");
}

#[test]
fn cli_subst_literal() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("subst")
        .arg("--literal")
        .arg(r"\d+")
        .arg("$1")
        .write_stdin("x 10 y 20")
        .assert()
        .success()
        .stdout("x $1 y $1");
}

#[test]
fn cli_split() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("split")
        .arg(",")
        .write_stdin("a,b,,c\n")
        .assert()
        .success()
        .stdout("a\nb\n\nc\n");

    Command::cargo_bin("rx")
        .unwrap()
        .arg("split")
        .arg("[ab]+")
        .write_stdin("ab12ba34")
        .assert()
        .success()
        .stdout("\n12\n34\n");
}
