use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Creates `<prefix>/software/<os>/<subdir>` for each subdir.
fn layer(prefix: &Path, subdirs: &[&str]) {
    let root = prefix.join("software").join(std::env::consts::OS);
    fs::create_dir_all(&root).unwrap();
    for subdir in subdirs {
        fs::create_dir_all(root.join(subdir)).unwrap();
    }
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("eessi-software-subdir").unwrap();
    cmd.env_remove("EESSI_SOFTWARE_SUBDIR_OVERRIDE")
        .env_remove("EESSI_UARCH_CATALOG")
        .env_remove("RUST_LOG");
    cmd
}

fn broadwell(prefix: &Path) -> Command {
    let mut cmd = cmd();
    cmd.arg(prefix)
        .arg("--cpuinfo")
        .arg(fixture("broadwell_cpuinfo"))
        .args(["--arch", "x86_64"]);
    cmd
}

#[test]
fn picks_most_specific_compatible_target() {
    let dir = tempfile::tempdir().unwrap();
    layer(
        dir.path(),
        &[
            "x86_64/generic",
            "x86_64/intel/nehalem",
            "x86_64/intel/haswell",
            "x86_64/intel/skylake_avx512",
            "x86_64/amd/zen2",
        ],
    );
    broadwell(dir.path())
        .assert()
        .success()
        .stdout("x86_64/intel/haswell\n")
        .stderr("");
}

#[test]
fn unknown_target_warns_and_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["x86_64/generic", "x86_64/intel/no_such_intel_cpu"]);
    broadwell(dir.path())
        .assert()
        .success()
        .stdout("x86_64/generic\n")
        .stderr(predicate::str::contains(
            "WARNING: Ignoring unknown target \"no_such_intel_cpu\"",
        ));
}

#[test]
fn missing_prefix_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("nope");
    broadwell(&prefix)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("ERROR: Specified prefix \""))
        .stderr(predicate::str::contains("\" does not exist!"));
}

#[test]
fn missing_family_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["aarch64/generic"]);
    broadwell(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("x86_64\" does not exist!"));
}

#[test]
fn no_compatible_target_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["x86_64/intel/skylake"]);
    broadwell(dir.path())
        .assert()
        .code(1)
        .stdout("")
        .stderr("ERROR: No compatible targets found for x86_64/intel/broadwell\n");
}

#[test]
fn generic_flag() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["x86_64/intel/broadwell"]);
    broadwell(dir.path())
        .arg("--generic")
        .assert()
        .success()
        .stdout("x86_64/generic\n");
}

#[test]
fn override_is_returned_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    broadwell(&dir.path().join("nope"))
        .env("EESSI_SOFTWARE_SUBDIR_OVERRIDE", "x86_64/amd/zen3")
        .env("EESSI_UARCH_CATALOG", dir.path().join("missing.toml"))
        .assert()
        .success()
        .stdout("x86_64/amd/zen3\n");
}

#[test]
fn host_subdirs_per_family() {
    cmd()
        .arg("--host")
        .arg("--cpuinfo")
        .arg(fixture("broadwell_cpuinfo"))
        .args(["--arch", "x86_64"])
        .assert()
        .success()
        .stdout("x86_64/intel/broadwell\n");

    cmd()
        .arg("--host")
        .arg("--cpuinfo")
        .arg(fixture("neoverse_n1_cpuinfo"))
        .args(["--arch", "aarch64"])
        .assert()
        .success()
        .stdout("aarch64/neoverse_n1\n");

    cmd()
        .arg("--host")
        .arg("--cpuinfo")
        .arg(fixture("power9_cpuinfo"))
        .args(["--arch", "ppc64le"])
        .assert()
        .success()
        .stdout("ppc64le/power9le\n");
}

#[test]
fn neoverse_n2_uses_n1_build() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["aarch64/generic", "aarch64/neoverse_n1", "aarch64/neoverse_v1"]);
    let n2 = |cmd: &mut Command| {
        cmd.arg("--cpuinfo")
            .arg(fixture("neoverse_n2_cpuinfo"))
            .args(["--arch", "aarch64"]);
    };

    let mut host = cmd();
    host.arg("--host");
    n2(&mut host);
    host.assert().success().stdout("aarch64/neoverse_n2\n");

    let mut resolve = cmd();
    resolve.arg(dir.path());
    n2(&mut resolve);
    resolve.assert().success().stdout("aarch64/neoverse_n1\n");
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    layer(dir.path(), &["aarch64/generic", "aarch64/neoverse_n1", "aarch64/neoverse_v1"]);
    let output = cmd()
        .arg(dir.path())
        .arg("--cpuinfo")
        .arg(fixture("neoverse_n1_cpuinfo"))
        .args(["--arch", "aarch64", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["subdir"], "aarch64/neoverse_n1");
    assert_eq!(report["selection"], "matched");
    assert_eq!(report["host"]["name"], "neoverse_n1");
    assert_eq!(report["candidates"].as_array().unwrap().len(), 3);
}

#[test]
fn custom_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.toml");
    fs::write(
        &catalog,
        r#"
[[microarchitecture]]
name = "riscv64"
family = "riscv64"
vendor = "generic"

[[microarchitecture]]
name = "rv64gc"
family = "riscv64"
vendor = "generic"
parents = ["riscv64"]
features = ["rv64gc"]
"#,
    )
    .unwrap();
    let cpuinfo = dir.path().join("cpuinfo");
    fs::write(&cpuinfo, "processor : 0\nflags : rv64gc\n").unwrap();
    layer(dir.path(), &["riscv64/generic", "riscv64/rv64gc"]);

    cmd()
        .arg(dir.path())
        .arg("--catalog")
        .arg(&catalog)
        .arg("--cpuinfo")
        .arg(&cpuinfo)
        .args(["--arch", "riscv64"])
        .assert()
        .success()
        .stdout("riscv64/rv64gc\n");
}

#[test]
fn usage_error_is_one_error_line() {
    let output = cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1);
    assert!(stderr.starts_with("ERROR: "));
    assert!(stderr.contains("<PREFIX>"));

    cmd().arg("--help").assert().success();
}
