//! End-to-end tests for the `cert-gen` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use certgen_pki::{Certificate, validate_certificate, validate_self_signed};
use predicates::prelude::*;

const ROOT_AND_LEAF: &str = r"
certificates:
  - common_name: Root CA
    country: US
    organization: Example Corp
    expires: 87600h
    install_to: ./pki
    filename_prefix: root
    issue:
      - common_name: leaf.example.com
        expires: 720h
        subject_alternative_names:
          - leaf.example.com
          - 10.0.0.5
        install_to: ./pki
        filename_prefix: leaf
";

fn write_config(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("certificates.yml");
    fs::write(&path, yaml).unwrap();
    path
}

fn cert_gen(dir: &Path, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cert-gen").unwrap();
    cmd.env_remove("CERTGEN_CONFIG")
        .env_remove("CERTGEN_OUTPUT_ROOT")
        .arg("--config")
        .arg(config)
        .arg("--output-root")
        .arg(dir);
    cmd
}

#[test]
fn generate_writes_a_verifiable_chain() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), ROOT_AND_LEAF);

    cert_gen(dir.path(), &config)
        .args(["generate", "--key-bits", "2048"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issued: 2 certificate(s), failed: 0"));

    for file in ["root.key", "root.crt", "leaf.key", "leaf.crt"] {
        assert!(dir.path().join("pki").join(file).is_file(), "missing {file}");
    }

    let root = Certificate::from_pem_file(&dir.path().join("pki/root.crt")).unwrap();
    let leaf = Certificate::from_pem_file(&dir.path().join("pki/leaf.crt")).unwrap();
    validate_self_signed(&root).unwrap();
    validate_certificate(&leaf, &root).unwrap();
    assert_eq!(leaf.san().len(), 2);
}

#[test]
fn verify_after_generate_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), ROOT_AND_LEAF);

    cert_gen(dir.path(), &config)
        .args(["generate", "--key-bits", "2048"])
        .assert()
        .success();

    let output = cert_gen(dir.path(), &config)
        .args(["verify", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["verified"].as_array().unwrap().len(), 2);
    assert_eq!(report["verified"][1]["issuer"], "Root CA");
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn malformed_expires_fails_only_that_subtree() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &ROOT_AND_LEAF.replace("720h", "thirty days"));

    cert_gen(dir.path(), &config)
        .args(["generate", "--key-bits", "2048"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Root CA/leaf.example.com"))
        .stderr(predicate::str::contains("1 of 2 certificate(s) failed"));

    assert!(dir.path().join("pki/root.crt").is_file());
    assert!(!dir.path().join("pki/leaf.crt").exists());
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    cert_gen(dir.path(), &dir.path().join("nope.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn invalid_key_bits_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), ROOT_AND_LEAF);

    cert_gen(dir.path(), &config)
        .args(["generate", "--key-bits", "512"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--key-bits"));

    assert!(!dir.path().join("pki").exists());
}
