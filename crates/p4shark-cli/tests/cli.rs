use std::fs;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("p4-gen-wireshark"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn golden_dir() -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join("ethernet_ipv4_tcp")
}

fn sample_graph() -> std::path::PathBuf {
    golden_dir().join("graph.json")
}

fn expected_script(protocol: &str) -> String {
    fs::read_to_string(golden_dir().join(format!("expected-{protocol}.lua")))
        .expect("read expected script")
}

#[test]
fn help_succeeds() {
    cmd().arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.json");

    cmd()
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn non_json_input_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let source = temp.path().join("simple_nat.p4");
    fs::write(&source, "header_type ethernet_t {}").expect("write p4 source");

    cmd()
        .arg(source)
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn malformed_graph_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let graph = temp.path().join("broken.json");
    fs::write(&graph, "{\"states\": [{\"name\": \"start\", \"branches\": [{\"value\": 1, \"next\": \"nowhere\"}]}]}")
        .expect("write graph");

    cmd()
        .arg(graph)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid parse graph").and(contains("unknown state nowhere")));
}

#[test]
fn unknown_protocol_lists_available_ones() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("sctp.lua");

    cmd()
        .arg(sample_graph())
        .arg("-p")
        .arg("sctp")
        .arg("-d")
        .arg(&output)
        .assert()
        .failure()
        .stderr(contains("protocol not found: sctp").and(contains("available protocols: ipv4, tcp")));
    assert!(!output.exists());
}

#[test]
fn stdout_outputs_script() {
    let assert = cmd()
        .arg(sample_graph())
        .arg("-p")
        .arg("tcp")
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert_eq!(stdout, expected_script("tcp"));
}

#[test]
fn destination_and_protocol_write_single_file() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("foo.lua");

    cmd()
        .arg(sample_graph())
        .arg("-d")
        .arg(&output)
        .arg("-p")
        .arg("tcp")
        .assert()
        .success()
        .stderr(contains("OK:"));

    let written = fs::read_to_string(&output).expect("read output");
    assert_eq!(written, expected_script("tcp"));
}

#[test]
fn default_destination_is_named_after_graph_and_protocol() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .current_dir(temp.path())
        .arg(sample_graph())
        .arg("-p")
        .arg("ipv4")
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join("graph-ipv4.lua")).expect("read output");
    assert_eq!(written, expected_script("ipv4"));
}

#[test]
fn every_protocol_is_written_without_protocol_flag() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg(sample_graph())
        .arg("-d")
        .arg(temp.path())
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    for protocol in ["ipv4", "tcp"] {
        let path = temp.path().join(format!("graph-{protocol}.lua"));
        let written = fs::read_to_string(&path).expect("read output");
        assert_eq!(written, expected_script(protocol));
    }
}

#[test]
fn missing_destination_directory_fails() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("missing").join("foo.lua");

    cmd()
        .arg(sample_graph())
        .arg("-d")
        .arg(&output)
        .arg("-p")
        .arg("tcp")
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}

#[test]
fn stdout_and_destination_conflict() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg(sample_graph())
        .arg("--stdout")
        .arg("-d")
        .arg(temp.path().join("foo.lua"))
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn custom_template_replaces_embedded_one() {
    let temp = TempDir::new().expect("tempdir");
    let template = temp.path().join("template.lua");
    fs::write(&template, "-- site helpers").expect("write template");

    cmd()
        .arg(sample_graph())
        .arg("-p")
        .arg("tcp")
        .arg("--template")
        .arg(&template)
        .arg("--stdout")
        .assert()
        .success()
        .stdout(
            predicates::str::starts_with("-- site helpers\n\n-- Auto generated section\n")
                .and(contains("function tobits").not()),
        );
}

#[test]
fn intended_overrides_change_registration() {
    let temp = TempDir::new().expect("tempdir");
    let graph = temp.path().join("gre.json");
    fs::write(
        &graph,
        r#"{"states": [
            {"name": "parse_gre", "select": ["gre.protocol"],
             "fields": [{"name": "protocol", "width": 16}],
             "branches": [{"value": 25944, "next": "parse_inner"}]},
            {"name": "parse_inner", "fields": [{"name": "x", "width": 8}]}
        ]}"#,
    )
    .expect("write graph");

    cmd()
        .arg(&graph)
        .arg("-p")
        .arg("inner")
        .arg("--stdout")
        .assert()
        .success()
        .stdout(contains("DissectorTable.get(\"ip.proto\")"));

    cmd()
        .arg(&graph)
        .arg("-p")
        .arg("inner")
        .arg("--stdout")
        .arg("--intended-overrides")
        .assert()
        .success()
        .stdout(contains("DissectorTable.get(\"protocol\")"));
}
