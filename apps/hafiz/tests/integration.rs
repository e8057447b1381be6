//! Integration tests for the hafiz CLI

use httpmock::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[network]\nstall_timeout = 5\n").unwrap();
        std::fs::write(dir.path().join("catalog.toml"), "").unwrap();
        Self { dir }
    }

    fn content_root(&self) -> PathBuf {
        self.dir.path().join("content")
    }

    fn write_catalog(&self, contents: &str) {
        std::fs::write(self.dir.path().join("catalog.toml"), contents).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_hafiz"))
            .arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .arg("--catalog")
            .arg(self.dir.path().join("catalog.toml"))
            .arg("--content-root")
            .arg(self.content_root())
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("HAFIZ_CONTENT_ROOT")
            .env_remove("HAFIZ_CATALOG")
            .output()
            .expect("Failed to execute hafiz")
    }

    fn run_json(&self, args: &[&str]) -> (Output, serde_json::Value) {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let value = serde_json::from_slice(&output.stdout).unwrap_or(serde_json::Value::Null);
        (output, value)
    }
}

fn quran_archive() -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .add_directory("ayah/", SimpleFileOptions::default())
        .unwrap();
    writer
        .start_file("ayah/surah_1.json", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(br#"{"surah":1,"ayahs":7}"#).unwrap();
    writer
        .start_file("reciters.json", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"[]").unwrap();
    writer.finish().unwrap().into_inner()
}

fn leftovers(root: &Path, area: &str) -> usize {
    std::fs::read_dir(root.join(area)).map_or(0, Iterator::count)
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_hafiz"))
        .arg("--version")
        .output()
        .expect("Failed to execute hafiz");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hafiz"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_hafiz"))
        .arg("--help")
        .output()
        .expect("Failed to execute hafiz");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Download and install hafiz content packages"));
    for command in ["install", "uninstall", "status", "list", "path", "clean"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_hafiz"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute hafiz");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_install_no_packages() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["install"]);
    assert!(!output.status.success());
}

#[test]
fn test_list_empty_content_root() {
    let sandbox = Sandbox::new();
    let (output, value) = sandbox.run_json(&["list"]);
    assert!(output.status.success());
    assert_eq!(value, serde_json::json!([]));
    assert!(sandbox.content_root().is_dir());
}

#[test]
fn test_path_resolves_inside_namespace() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["path", "quran", "ayah/surah_1.json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = sandbox.content_root().join("quran").join("ayah").join("surah_1.json");
    assert_eq!(stdout.trim(), expected.display().to_string());
}

#[test]
fn test_path_rejects_escape() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["path", "quran", "../secrets.txt"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_install_unknown_package() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["install", "hadith"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hadith"));
}

#[test]
fn test_install_status_uninstall_roundtrip() {
    let server = MockServer::start();
    let archive = quran_archive();
    let download = server.mock(|when, then| {
        when.method(GET).path("/quran_data.zip");
        then.status(200).body(&archive);
    });

    let sandbox = Sandbox::new();
    sandbox.write_catalog(&format!(
        "[[package]]\nid = \"quran\"\nurl = \"{}\"\nsize = {}\nentries = [\"ayah/surah_1.json\", \"reciters.json\"]\n",
        server.url("/quran_data.zip"),
        archive.len()
    ));

    let (output, value) = sandbox.run_json(&["install", "quran"]);
    assert!(
        output.status.success(),
        "install failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    download.assert();
    assert_eq!(value[0]["package_id"], "quran");
    assert_eq!(value[0]["status"], "success");
    assert_eq!(value[0]["bytes_downloaded"], archive.len());

    let root = sandbox.content_root();
    assert_eq!(
        std::fs::read_to_string(root.join("quran/ayah/surah_1.json")).unwrap(),
        r#"{"surah":1,"ayahs":7}"#
    );
    assert_eq!(leftovers(&root, ".staging"), 0);
    assert_eq!(leftovers(&root, ".downloads"), 0);

    let (output, value) = sandbox.run_json(&["status"]);
    assert!(output.status.success());
    assert_eq!(value[0]["package"], "quran");
    assert_eq!(value[0]["installed"], true);

    let (output, value) = sandbox.run_json(&["list"]);
    assert!(output.status.success());
    assert_eq!(value[0]["package"], "quran");

    let (output, value) = sandbox.run_json(&["uninstall", "quran"]);
    assert!(output.status.success());
    assert_eq!(value[0]["removed"], true);
    assert!(!root.join("quran").exists());

    let (_, value) = sandbox.run_json(&["uninstall", "quran"]);
    assert_eq!(value[0]["removed"], false);
}

#[test]
fn test_failed_install_reports_kind_and_exits_nonzero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/duas.zip");
        then.status(404);
    });

    let sandbox = Sandbox::new();
    sandbox.write_catalog(&format!(
        "[[package]]\nid = \"duas\"\nurl = \"{}\"\nsize = 1024\n",
        server.url("/duas.zip")
    ));

    let (output, value) = sandbox.run_json(&["install", "duas"]);
    assert!(!output.status.success());
    assert_eq!(value[0]["status"], "failed");
    assert_eq!(value[0]["error"]["kind"], "network");
    assert_eq!(value[0]["error"]["phase"], "downloading");
    assert!(!sandbox.content_root().join("duas").exists());
}

#[test]
fn test_remote_catalog() {
    let server = MockServer::start();
    let archive = quran_archive();
    let catalog = format!(
        "[[package]]\nid = \"quran\"\nurl = \"{}\"\nsize = {}\n",
        server.url("/quran_data.zip"),
        archive.len()
    );
    server.mock(|when, then| {
        when.method(GET).path("/catalog.toml");
        then.status(200).body(&catalog);
    });

    let sandbox = Sandbox::new();
    let output = Command::new(env!("CARGO_BIN_EXE_hafiz"))
        .arg("--config")
        .arg(sandbox.dir.path().join("config.toml"))
        .arg("--catalog")
        .arg(server.url("/catalog.toml"))
        .arg("--content-root")
        .arg(sandbox.content_root())
        .args(["--json", "status"])
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute hafiz");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["package"], "quran");
    assert_eq!(value[0]["installed"], false);
    assert_eq!(value[0]["declared_size_bytes"], archive.len());
}

#[test]
fn test_clean_on_fresh_root() {
    let sandbox = Sandbox::new();
    let (output, value) = sandbox.run_json(&["clean"]);
    assert!(output.status.success());
    assert_eq!(value["removed"], serde_json::json!([]));
    assert_eq!(value["failed"], serde_json::json!([]));
}
