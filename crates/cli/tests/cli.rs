use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pkg")).unwrap();
    fs::write(
        dir.path().join("pkg/a.py"),
        "from pkg.b import f\n\nclass A:\n    \"\"\"Entry point.\"\"\"\n\n    def m(self):\n        f()\n",
    )
    .unwrap();
    fs::write(dir.path().join("pkg/b.py"), "def f():\n    pass\n").unwrap();
    dir
}

fn scaffold(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scaffold").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "error");
    cmd
}

#[test]
fn index_then_query_the_store() {
    let dir = project();

    let output = scaffold(&dir).args(["index", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["files"], 2);
    assert_eq!(stats["nodes"]["CLASS"], 1);
    assert!(dir.path().join(".scaffold/graph.json").exists());

    let output = scaffold(&dir).args(["show", "A", "--json"]).output().unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["label"], "ClassNode");
    assert_eq!(entries[0]["node"]["docstring"], "Entry point.");
    assert_eq!(
        entries[0]["relationships"]["defines_functions"][0]["name"],
        "m"
    );

    let output = scaffold(&dir).args(["stats", "--json"]).output().unwrap();
    let counts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts["FileNode"], 2);
    assert_eq!(counts["FolderNode"], 1);
}

#[test]
fn files_are_found_by_their_relative_path() {
    let dir = project();
    fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
    fs::create_dir_all(dir.path().join("other")).unwrap();
    fs::write(dir.path().join("other/__init__.py"), "").unwrap();
    scaffold(&dir).arg("index").assert().success();

    let output = scaffold(&dir)
        .args(["show", "pkg/__init__.py", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["label"], "FileNode");
    assert_eq!(entries[0]["node"]["path"], "pkg/__init__.py");

    let output = scaffold(&dir)
        .args(["show", "pkg/a.py", "--json"])
        .output()
        .unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["relationships"]["defines_classes"][0]["name"], "A");
}

#[test]
fn clear_replaces_previous_run() {
    let dir = project();
    scaffold(&dir).arg("index").assert().success();
    scaffold(&dir).arg("index").assert().success();

    let output = scaffold(&dir).args(["stats", "--json"]).output().unwrap();
    let counts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts["FileNode"], 4);

    scaffold(&dir).args(["index", "--clear"]).assert().success();
    let output = scaffold(&dir).args(["stats", "--json"]).output().unwrap();
    let counts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts["FileNode"], 2);
}

#[test]
fn tree_does_not_touch_the_store() {
    let dir = project();
    let output = scaffold(&dir).arg("tree").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("pkg/\n"));
    assert!(text.contains("class A [3-7]"));
    assert!(!dir.path().join(".scaffold").exists());
}

#[test]
fn missing_directory_fails() {
    let dir = project();
    scaffold(&dir)
        .args(["index", "--path", "does-not-exist"])
        .assert()
        .failure();
}
