use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use tempfile::TempDir;

const PROXY_VARS: [&str; 6] = [
    "http_proxy",
    "HTTP_PROXY",
    "https_proxy",
    "HTTPS_PROXY",
    "all_proxy",
    "ALL_PROXY",
];

/// Serves a single canned JSON response on an ephemeral port.
fn serve_once(body: &'static str) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/plasma.json", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    });
    (url, handle)
}

fn solarshade(config_dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_solarshade"));
    command
        .env("SOLARSHADE_CONFIG_DIR", config_dir)
        .env_remove("SOLARSHADE_ENDPOINT")
        .env("RUST_LOG", "warn");
    for var in PROXY_VARS {
        command.env_remove(var);
    }
    command
        .args(args)
        .output()
        .expect("failed to run solarshade")
}

#[test]
fn presets_lists_every_preset() {
    let root = TempDir::new().unwrap();
    let output = solarshade(root.path(), &["presets"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aurora (default)"));
    assert!(stdout.contains("ember"));
    assert!(stdout.contains("tide"));
}

#[test]
fn probe_prints_normalized_reading() {
    let root = TempDir::new().unwrap();
    let (url, server) = serve_once(
        r#"[["time_tag","density","speed","temperature"],["2024-05-01 12:00:00.000","3.1","300","1"],["2024-05-01 12:05:00.000","3.4","500","1"]]"#,
    );

    let output = solarshade(root.path(), &["--endpoint", &url, "probe"]);
    server.join().unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("speed: 500.0 km/s"), "stdout: {stdout}");
    assert!(stdout.contains("observed: 2024-05-01 12:05:00"), "stdout: {stdout}");
    assert!(stdout.contains("control: 0.4545"), "stdout: {stdout}");
}

#[test]
fn probe_reads_endpoint_from_config_file() {
    let root = TempDir::new().unwrap();
    let (url, server) = serve_once(r#"[["time_tag","density","speed"],["2024-05-01 12:05:00.000","1.0","800"]]"#);
    fs::write(
        root.path().join("config.toml"),
        format!("[signal]\nendpoint = \"{url}\"\n"),
    )
    .unwrap();

    let output = solarshade(root.path(), &["probe"]);
    server.join().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("control: 1.0000"), "stdout: {stdout}");
}

#[test]
fn probe_fails_on_malformed_payload() {
    let root = TempDir::new().unwrap();
    let (url, server) = serve_once("<html>maintenance</html>");

    let output = solarshade(root.path(), &["--endpoint", &url, "probe"]);
    server.join().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to probe"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[signal]\ninterval = 0\n").unwrap();

    let output = solarshade(root.path(), &["probe"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("interval"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");

    let output = solarshade(
        root.path(),
        &["--config", missing.to_str().unwrap(), "probe"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.toml"));
}

#[test]
fn unknown_preset_flag_is_rejected() {
    let root = TempDir::new().unwrap();
    let output = solarshade(root.path(), &["--preset", "sunset", "presets"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}
