use std::ffi::OsString;
use std::fs;
use std::path::Path;

use focus_core::render::NO_FOCUS_HINT;
use focus_core::store::DEFAULT_STORE_KEY;
use focus_core::task::Task;
use tempfile::tempdir;

fn run_cli(data_dir: &Path, focusrc: &Path, args: &[&str]) -> String {
    let mut argv: Vec<OsString> = vec![
        "focus".into(),
        "--data".into(),
        data_dir.as_os_str().to_os_string(),
        "--focusrc".into(),
        focusrc.as_os_str().to_os_string(),
        "rc.notify=off".into(),
    ];
    argv.extend(args.iter().map(OsString::from));

    let mut out = Vec::new();
    focus_core::run_with_output(argv, &mut out).expect("cli run");
    String::from_utf8(out).expect("utf8 output")
}

fn stored(data_dir: &Path, key: &str) -> Vec<Task> {
    let raw = fs::read_to_string(data_dir.join(format!("{key}.json"))).expect("read blob");
    serde_json::from_str(&raw).expect("parse blob")
}

#[test]
fn add_done_delete_through_the_cli() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "color = off\n").expect("write focusrc");

    run_cli(&data_dir, &focusrc, &["add", "Write", "report"]);
    run_cli(&data_dir, &focusrc, &["a", "Call", "client"]);

    let tasks = stored(&data_dir, DEFAULT_STORE_KEY);
    let texts: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["Call client", "Write report"]);

    // No ref: completes the current focus.
    run_cli(&data_dir, &focusrc, &["done"]);
    let tasks = stored(&data_dir, DEFAULT_STORE_KEY);
    assert!(tasks[0].completed);
    assert!(!tasks[1].completed);

    run_cli(&data_dir, &focusrc, &["delete", "2"]);
    let tasks = stored(&data_dir, DEFAULT_STORE_KEY);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].text, "Call client");

    let listed = run_cli(&data_dir, &focusrc, &["list"]);
    assert!(listed.contains("Task List (1)"));
    assert!(listed.contains("Call client"));

    let overview = run_cli(&data_dir, &focusrc, &[]);
    assert!(overview.contains(NO_FOCUS_HINT));
    assert!(overview.contains("Task List (1)"));
}

#[test]
fn focus_card_and_current_alias() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "color = off\n").expect("write focusrc");

    assert_eq!(run_cli(&data_dir, &focusrc, &["focus"]), format!("{NO_FOCUS_HINT}\n"));

    run_cli(&data_dir, &focusrc, &["add", "Write report"]);
    run_cli(&data_dir, &focusrc, &["add", "Call client"]);

    let card = run_cli(&data_dir, &focusrc, &["focus"]);
    assert_eq!(card, "Current Focus\n  Call client\n");
    assert_eq!(run_cli(&data_dir, &focusrc, &["current"]), card);
}

#[test]
fn export_prints_the_stored_list() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "color = off\n").expect("write focusrc");

    run_cli(&data_dir, &focusrc, &["add", "Write report"]);
    run_cli(&data_dir, &focusrc, &["done"]);

    let exported = run_cli(&data_dir, &focusrc, &["export"]);
    let tasks: Vec<Task> = serde_json::from_str(&exported).expect("export is json");
    assert_eq!(tasks, stored(&data_dir, DEFAULT_STORE_KEY));
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
}

#[test]
fn version_prints_the_package_version() {
    let temp = tempdir().expect("tempdir");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "").expect("write focusrc");

    let printed = run_cli(temp.path(), &focusrc, &["version"]);
    assert_eq!(printed.trim(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn store_key_comes_from_config() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "store.key = workTasks\ncolor = off\n").expect("write focusrc");

    run_cli(&data_dir, &focusrc, &["add", "Ship it"]);

    assert_eq!(stored(&data_dir, "workTasks").len(), 1);
    assert!(!data_dir.join(format!("{DEFAULT_STORE_KEY}.json")).exists());
}

#[test]
fn unknown_command_is_an_error() {
    let temp = tempdir().expect("tempdir");
    let focusrc = temp.path().join("focusrc");
    fs::write(&focusrc, "").expect("write focusrc");

    let argv: Vec<OsString> = vec![
        "focus".into(),
        "--data".into(),
        temp.path().as_os_str().to_os_string(),
        "--focusrc".into(),
        focusrc.as_os_str().to_os_string(),
        "frobnicate".into(),
    ];
    assert!(focus_core::run(argv).is_err());
}
