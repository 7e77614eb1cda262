use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

#[test]
fn match_flags() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.child("config.toml");

    config_file
        .write_str(
            r#"
            [match]
            case_insensitive = true
            "#,
        )
        .unwrap();

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg(config_file.path())
        .arg("match")
        .arg("B")
        .write_stdin("abc\nxyz\n")
        .assert()
        .success()
        .stdout("abc\n");
}

#[test]
fn step_limit() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.child("config.toml");

    config_file
        .write_str(
            r#"
            [match]
            step_limit = 1000
            "#,
        )
        .unwrap();

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg(config_file.path())
        .arg("match")
        .arg("--count")
        .arg("(a|a)*b")
        .write_stdin("a".repeat(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("limit exceeded"));
}

#[test]
fn depth_limit() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.child("config.toml");

    config_file
        .write_str(
            r#"
            [match]
            depth_limit = 10
            "#,
        )
        .unwrap();

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg(config_file.path())
        .arg("match")
        .arg("a*")
        .write_stdin("a".repeat(20))
        .assert()
        .failure()
        .stderr(predicate::str::contains("limit exceeded"));

    // The command line takes precedence over the config file.
    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg(config_file.path())
        .arg("--depth-limit")
        .arg("0")
        .arg("match")
        .arg("a*")
        .write_stdin("a".repeat(20))
        .assert()
        .success()
        .stdout(format!("{}\n", "a".repeat(20)));
}

#[test]
fn invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.child("config.toml");

    config_file
        .write_str(
            r#"
            [match]
            unknown_option = true
            "#,
        )
        .unwrap();

    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg(config_file.path())
        .arg("match")
        .arg("a")
        .write_stdin("a\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with(
            "error: can not load config file",
        ));
}

#[test]
fn missing_config() {
    Command::cargo_bin("rx")
        .unwrap()
        .arg("--config")
        .arg("missing.toml")
        .arg("match")
        .arg("a")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}
