#[test]
fn webgaze_help_lists_subcommands() {
    use predicates::prelude::*;
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("webgaze"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mcp-stdio"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn webgaze_version_json_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("webgaze");
    let out = std::process::Command::new(bin)
        .args(["version"])
        .output()
        .expect("run webgaze version");

    assert!(out.status.success(), "webgaze version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(s.trim()).expect("version output is JSON");
    assert_eq!(v["kind"], "version");
    assert_eq!(v["name"], "webgaze");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn webgaze_version_text_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("webgaze");
    let out = std::process::Command::new(bin)
        .args(["version", "--output", "text"])
        .output()
        .expect("run webgaze version --output text");

    assert!(out.status.success(), "webgaze version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(
        s.trim_start().starts_with("webgaze "),
        "expected text output to start with `webgaze `"
    );
}

#[test]
fn webgaze_doctor_json_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("webgaze");
    let out = std::process::Command::new(bin)
        .args(["doctor"])
        .env_remove("WEBGAZE_BROWSER_BIN")
        .env_remove("WEBGAZE_DDG_ENDPOINT")
        .env_remove("WEBGAZE_NAV_TIMEOUT_MS")
        .output()
        .expect("run webgaze doctor");

    assert!(out.status.success(), "webgaze doctor failed");
    let s = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(s.trim()).expect("doctor output is JSON");
    assert_eq!(v["kind"], "doctor");
    assert!(v.get("browser").is_some(), "doctor reports browser status");
    assert!(
        v["search"]["ddg_endpoint_override"].is_null(),
        "no endpoint override without the env var"
    );
}

#[test]
fn webgaze_doctor_text_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("webgaze");
    let out = std::process::Command::new(bin)
        .args(["doctor", "--output", "text"])
        .output()
        .expect("run webgaze doctor --output text");

    assert!(out.status.success(), "webgaze doctor failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(
        s.contains("webgaze "),
        "expected doctor text output to mention webgaze"
    );
    assert!(s.contains("checks:"), "expected checks summary");
}
