use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Test context with an isolated mirror root
struct TestContext {
    _temp_dir: TempDir,
    mirror: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mirror = temp_dir.path().join(".pypickup");
        Self {
            _temp_dir: temp_dir,
            mirror,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pypickup"));
        cmd.arg("--index-path").arg(&self.mirror);
        cmd.env_remove("PYPICKUP_INDEX_PATH");
        cmd.env_remove("PYPICKUP_REMOTE");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().expect("failed to run pypickup")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("rebuild-index"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("pypickup"));
}

#[test]
fn test_list_on_empty_mirror() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No packages"));
}

#[test]
fn test_invalid_filters_fail_before_network() {
    let ctx = TestContext::new();
    let settings = ctx.mirror.join("settings");
    std::fs::create_dir_all(&settings).unwrap();
    std::fs::write(
        settings.join("wheel-filters.toml"),
        "enabled = true\n[fields.version]\nrules = [\">=1.0\"]\n",
    )
    .unwrap();

    // Port 9 is never contacted: the settings are rejected first.
    let output = ctx.run(&["add", "six", "--remote", "http://127.0.0.1:9/simple"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("python_tags"), "stderr: {stderr}");
    assert!(!ctx.mirror.join("index.html").exists());
}

#[test]
fn test_add_update_remove_round() {
    let ctx = TestContext::new();
    let mut server = mockito::Server::new();
    let base = server.url();

    let listing = format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Links for six</h1>
    <a href="{base}/files/six-1.16.0-py2.py3-none-any.whl#sha256=aa">six-1.16.0-py2.py3-none-any.whl</a>
    <a href="{base}/files/six-1.16.0-cp39-cp39-manylinux1_x86_64.whl#sha256=bb">six-1.16.0-cp39-cp39-manylinux1_x86_64.whl</a>
    <a href="{base}/files/six-1.16.0.tar.gz#sha256=cc">six-1.16.0.tar.gz</a>
    <a href="{base}/files/six-1.16.0.zip#sha256=dd">six-1.16.0.zip</a>
  </body>
</html>
"#
    );

    let listing_mock = server
        .mock("GET", "/simple/six")
        .with_status(200)
        .with_body(&listing)
        .expect(3)
        .create();
    let wheel = server
        .mock("GET", "/files/six-1.16.0-py2.py3-none-any.whl")
        .with_body("wheel-bytes")
        .expect(1)
        .create();
    let zip = server
        .mock("GET", "/files/six-1.16.0.zip")
        .with_body("zip-bytes")
        .expect(1)
        .create();
    let skipped = server
        .mock("GET", "/files/six-1.16.0.tar.gz")
        .expect(0)
        .create();
    let platform = server
        .mock("GET", "/files/six-1.16.0-cp39-cp39-manylinux1_x86_64.whl")
        .expect(0)
        .create();

    let remote = format!("{base}/simple");

    let output = ctx.run(&["add", "six", "--remote", &remote, "--retries", "0"]);
    assert!(output.status.success(), "add failed: {output:?}");

    let package_dir = ctx.mirror.join("six");
    assert_eq!(
        std::fs::read(package_dir.join("six-1.16.0-py2.py3-none-any.whl")).unwrap(),
        b"wheel-bytes"
    );
    assert_eq!(
        std::fs::read(package_dir.join("six-1.16.0.zip")).unwrap(),
        b"zip-bytes"
    );
    assert!(!package_dir.join("six-1.16.0.tar.gz").exists());

    let index = std::fs::read_to_string(package_dir.join("index.html")).unwrap();
    assert!(index.contains("<h1>Links for six</h1>"));
    assert!(index.contains(
        "<a href=\"./six-1.16.0-py2.py3-none-any.whl\">six-1.16.0-py2.py3-none-any.whl</a>"
    ));
    assert!(index.contains("<a href=\"./six-1.16.0.zip\">six-1.16.0.zip</a>"));

    let root = std::fs::read_to_string(ctx.mirror.join("index.html")).unwrap();
    assert!(root.contains("<a href=\"./six\">six</a>"));

    // Adding again looks the package up remotely, then only advises update.
    let output = ctx.run(&["add", "six", "--remote", &remote, "--retries", "0"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("pypickup update six"));

    // Nothing new remotely: update downloads nothing and leaves the index alone.
    let output = ctx.run(&["update", "six", "--remote", &remote, "--retries", "0"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("up to date"));
    assert_eq!(
        std::fs::read_to_string(package_dir.join("index.html")).unwrap(),
        index
    );

    let output = ctx.run(&["list", "six"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("six-1.16.0.zip"));

    let output = ctx.run(&["remove", "six"]);
    assert!(output.status.success());
    assert!(!package_dir.exists());

    let output = ctx.run(&["list"]);
    assert!(stdout(&output).contains("No packages"));

    listing_mock.assert();
    wheel.assert();
    zip.assert();
    skipped.assert();
    platform.assert();
}

#[test]
fn test_rebuild_index_from_files() {
    let ctx = TestContext::new();
    let package_dir = ctx.mirror.join("requests");
    std::fs::create_dir_all(&package_dir).unwrap();
    std::fs::write(package_dir.join("requests-2.0.0.tar.gz"), b"b").unwrap();
    std::fs::write(package_dir.join("requests-1.0.0.tar.gz"), b"a").unwrap();
    std::fs::write(ctx.mirror.join("index.html"), "").unwrap();

    let output = ctx.run(&["rebuild-index"]);
    assert!(output.status.success(), "rebuild failed: {output:?}");

    let root = std::fs::read_to_string(ctx.mirror.join("index.html")).unwrap();
    assert!(root.contains("<a href=\"./requests\">requests</a>"));

    let index = std::fs::read_to_string(package_dir.join("index.html")).unwrap();
    let first = index.find("requests-1.0.0.tar.gz").unwrap();
    let second = index.find("requests-2.0.0.tar.gz").unwrap();
    assert!(first < second);
}
