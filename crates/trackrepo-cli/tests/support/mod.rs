#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("trackrepo");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("RUST_LOG");
    command.env_remove("TRACKREPO_GITHUB_API_URL");
    (command, temp_home)
}

pub fn config_dir(home: &Path) -> PathBuf {
    home.join(".config").join("trackrepo")
}

pub fn settings_path(home: &Path) -> PathBuf {
    config_dir(home).join("repository.toml")
}

pub fn write_config(home: &Path, contents: &str) {
    let dir = config_dir(home);
    fs::create_dir_all(&dir).expect("create config dir");
    fs::write(dir.join("config.toml"), contents).expect("write config");
}

pub fn write_custom_settings(home: &Path, user: &str, repo: &str, branch: &str) {
    let dir = config_dir(home);
    fs::create_dir_all(&dir).expect("create config dir");
    fs::write(
        dir.join("repository.toml"),
        format!(
            r#"version = 1
validated_at = "2026-01-02T03:04:05Z"

[repository]
mode = "custom"
username = "{user}"
repository = "{repo}"
branch = "{branch}"
"#
        ),
    )
    .expect("write settings");
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let address = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{address}")
}

pub struct StubGithub {
    pub url: String,
    handle: JoinHandle<String>,
}

impl StubGithub {
    /// Request line of the single request the stub served.
    pub fn request_line(self) -> String {
        self.handle.join().expect("stub thread")
    }
}

/// Answers exactly one HTTP request with `status_line` and `body`.
pub fn serve_once(status_line: &'static str, body: String) -> StubGithub {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request line");
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).expect("read header");
            if header == "\r\n" || header.is_empty() {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .expect("write response");
        request_line.trim_end().to_string()
    });

    StubGithub { url, handle }
}

pub fn branch_body(branch: &str, sha: &str) -> String {
    format!(r#"{{"name":"{branch}","commit":{{"sha":"{sha}"}}}}"#)
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
