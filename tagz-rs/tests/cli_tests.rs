//! Run the `tagz` binary and check what it prints.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Path to the `tagz` binary built by this Cargo workspace.
fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_tagz"))
}

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tagz binary");
    child
        .stdin
        .as_mut()
        .expect("stdin not open")
        .write_all(stdin.as_bytes())
        .expect("write to stdin");
    child.wait_with_output().expect("wait failed")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn evaluates_script_argument() {
    let out = run(&["-f", "-Dartist=Queen", "$upper(%artist%)"], "");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "QUEEN\n");
}

#[test]
fn batch_mode_shares_context() {
    let out = run(&["-f"], "$set(a,1)\n%a%$add(%a%,1)\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "\n12\n");
}

#[test]
fn batch_mode_reports_failures_and_continues() {
    let out = run(&["-f"], "$nope()\nstill here\n");
    assert!(!out.status.success());
    assert_eq!(stdout(&out), "still here\n");
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown function $nope"));
}

#[test]
fn config_file_seeds_context() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "/set album=Jazz\n/option max_depth=1").unwrap();
    let path = f.path().to_str().unwrap().to_owned();

    let out = run(&["-f", &path, "%album%"], "");
    assert_eq!(stdout(&out), "Jazz\n");

    let out = run(&["-f", &path, "$upper($lower(x))"], "");
    assert!(!out.status.success());

    // -m overrides the config file.
    let out = run(&["-f", &path, "-m2", "$upper($lower(x))"], "");
    assert_eq!(stdout(&out), "X\n");
}

#[test]
fn bad_option_exits_nonzero() {
    let out = run(&["-z"], "");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown option"));
}
