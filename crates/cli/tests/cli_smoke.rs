//! CLI smoke tests for dockersum.
//!
//! These tests run the binary against temporary build contexts and check
//! stdout, stderr and exit codes.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the dockersum binary.
fn dockersum_cmd() -> Command {
  cargo_bin_cmd!("dockersum")
}

const DOCKERFILE: &str = r#"
FROM alpine
COPY ./a/* /app
COPY ./${ARG1} /app
RUN --mount=type=bind,source=./c,target=/x ls /x
"#;

/// Create a context with a Dockerfile and a few source files.
fn temp_context() -> TempDir {
  let temp = TempDir::new().unwrap();
  fs::write(temp.path().join("Dockerfile"), DOCKERFILE).unwrap();
  for file in ["a/1", "a/2", "b", "c/1/1"] {
    let path = temp.path().join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, file).unwrap();
  }
  temp
}

fn run(ctx: &Path, extra: &[&str]) -> String {
  let output = dockersum_cmd()
    .current_dir(ctx)
    .args(["--build-arg", "ARG1=b", "--platform", "linux/amd64"])
    .args(extra)
    .arg(".")
    .output()
    .unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  String::from_utf8(output.stdout).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  dockersum_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  dockersum_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("dockersum"));
}

// =============================================================================
// checksum
// =============================================================================

#[test]
fn prints_bare_sha1_digest() {
  let ctx = temp_context();
  let out = run(ctx.path(), &[]);

  assert_eq!(out.len(), 40, "unexpected output: {out:?}");
  assert!(out.chars().all(|c| c.is_ascii_hexdigit()));
  assert!(!out.ends_with('\n'));
}

#[test]
fn output_is_deterministic() {
  let ctx = temp_context();
  assert_eq!(run(ctx.path(), &[]), run(ctx.path(), &[]));
}

#[test]
fn hash_flag_selects_algorithm() {
  let ctx = temp_context();
  assert_eq!(run(ctx.path(), &["--hash", "sha256"]).len(), 64);
  assert_eq!(run(ctx.path(), &["--hash", "md5"]).len(), 32);
}

#[test]
fn referenced_file_changes_output() {
  let ctx = temp_context();
  let before = run(ctx.path(), &[]);
  fs::write(ctx.path().join("c/1/1"), "changed").unwrap();
  assert_ne!(before, run(ctx.path(), &[]));
}

#[test]
fn comma_separated_platforms_match_repeated_flags() {
  let ctx = temp_context();
  let combined = run(ctx.path(), &["--platform", "linux/arm64"]);

  let output = dockersum_cmd()
    .current_dir(ctx.path())
    .args(["--build-arg", "ARG1=b", "--platform", "linux/arm64,linux/amd64", "."])
    .output()
    .unwrap();
  assert_eq!(combined, String::from_utf8(output.stdout).unwrap());
}

#[test]
fn label_changes_output() {
  let ctx = temp_context();
  assert_ne!(run(ctx.path(), &[]), run(ctx.path(), &["--label", "label1=value1"]));
}

#[test]
fn file_flag_is_relative_to_current_dir() {
  let ctx = temp_context();
  let recipes = TempDir::new().unwrap();
  fs::copy(ctx.path().join("Dockerfile"), recipes.path().join("build.Dockerfile")).unwrap();

  let from_ctx = run(ctx.path(), &[]);
  dockersum_cmd()
    .current_dir(recipes.path())
    .args(["-f", "build.Dockerfile", "--build-arg", "ARG1=b", "--platform", "linux/amd64"])
    .arg(ctx.path())
    .assert()
    .success()
    .stdout(predicate::eq(from_ctx));
}

#[test]
fn json_output_includes_paths() {
  let ctx = temp_context();
  let out = run(ctx.path(), &["--output", "json"]);
  let value: serde_json::Value = serde_json::from_str(&out).unwrap();

  assert_eq!(value["algorithm"], "sha1");
  assert_eq!(value["digest"].as_str().unwrap().len(), 40);
  let paths: Vec<_> = value["paths"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["path"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(paths, vec!["a/1", "a/2", "b", "c"]);
}

#[test]
fn debug_logs_go_to_stderr() {
  let ctx = temp_context();
  dockersum_cmd()
    .current_dir(ctx.path())
    .args(["--build-arg", "ARG1=b", "--debug", "."])
    .assert()
    .success()
    .stdout(predicate::str::is_match("^[0-9a-f]{40}$").unwrap())
    .stderr(predicate::str::contains("add to hash"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn missing_dockerfile_fails_without_output() {
  let temp = TempDir::new().unwrap();
  dockersum_cmd()
    .current_dir(temp.path())
    .arg(".")
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("Failed to compute checksum"));
}

#[test]
fn unknown_hash_fails() {
  let ctx = temp_context();
  dockersum_cmd()
    .current_dir(ctx.path())
    .args(["--hash", "crc32", "."])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("unknown hash algorithm"));
}

#[test]
fn build_arg_without_value_fails() {
  let ctx = temp_context();
  dockersum_cmd()
    .current_dir(ctx.path())
    .args(["--build-arg", "ARG1", "."])
    .assert()
    .failure()
    .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn malformed_dockerfile_fails() {
  let ctx = temp_context();
  fs::write(ctx.path().join("Dockerfile"), "FROM alpine\nCOPY ${OPEN /x\n").unwrap();
  dockersum_cmd()
    .current_dir(ctx.path())
    .arg(".")
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("line 2"));
}

#[test]
fn path_outside_context_fails() {
  let ctx = temp_context();
  fs::write(ctx.path().join("Dockerfile"), "FROM alpine\nCOPY ../elsewhere /x\n").unwrap();
  dockersum_cmd()
    .current_dir(ctx.path())
    .arg(".")
    .assert()
    .failure()
    .stderr(predicate::str::contains("outside of the build context"));
}

#[test]
fn missing_context_dir_fails() {
  let ctx = temp_context();
  dockersum_cmd()
    .current_dir(ctx.path())
    .args(["--build-arg", "ARG1=b", "no-such-dir"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("is not accessible"));
}
