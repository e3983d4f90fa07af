use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn loadinjectctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("harness.toml"))
        .arg("--no-color")
        .env_remove("LOADINJECT_CONFIG")
        .env_remove("RUST_LOG")
        .env("LOADINJECT_SCRATCH_DIR", dir.path());
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("LoadInject CLI"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("loadinjectctl"));
}

#[test]
fn test_run_command_help() {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.args(["run", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Run a single injection job"));
}

#[test]
fn test_plan_command_help() {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.args(["plan", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Run an injection plan from a JSON file"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("loadinjectctl").unwrap();
    cmd.arg("invalid-command");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_list_shows_builtin_aliases() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("SSDLoadInjector"))
        .stdout(predicate::str::contains("RAMLoadInjector"))
        .stdout(predicate::str::contains("SolidStateDrive"));
}

#[test]
fn test_missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration file not found"));

    loadinjectctl(&dir).args(["config", "init"]).assert().success();
    loadinjectctl(&dir)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration file not found").not());
}

#[test]
fn test_list_json() {
    let dir = TempDir::new().unwrap();
    let output = loadinjectctl(&dir)
        .args(["--format", "json", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let aliases: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(aliases["RAMLoadInjector"], serde_json::json!(["Memory", "RAM", "RAMUsage"]));
}

#[test]
fn test_run_memory_job_reports_interval() {
    let dir = TempDir::new().unwrap();
    let output = loadinjectctl(&dir)
        .args(["--format", "json", "run", "--type", "Memory", "--tag", "t1", "--duration-ms", "50"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let job = &report["jobs"][0];
    assert_eq!(job["name"], "[t1]RAMLoadInjector(d50)");
    assert_eq!(job["intervals"].as_array().unwrap().len(), 1);

    let interval = &job["intervals"][0];
    assert!(interval["end"].as_i64().unwrap() >= interval["start"].as_i64().unwrap());
}

#[test]
fn test_run_ssd_job_from_json() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .args(["run", "--job", r#"{"type":"SSD","duration_ms":20}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]SSDLoadInjector(d20)"));
}

#[test]
fn test_run_unknown_type() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .args(["run", "--type", "GPU"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("GPU"));
}

#[test]
fn test_run_malformed_job() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .args(["run", "--job", r#"{"type":"RAM","duration_ms":-5}"#])
        .assert()
        .code(4);
}

#[test]
fn test_plan_writes_report() {
    let dir = TempDir::new().unwrap();
    let plan_path = dir.path().join("plan.json");
    let report_path = dir.path().join("report.json");
    fs::write(
        &plan_path,
        r#"[
            {"type": "RAM", "tag": "a", "duration_ms": 30},
            {"type": "Unknown"},
            {"type": "SSDUsage", "tag": "b", "duration_ms": 30}
        ]"#,
    )
    .unwrap();

    loadinjectctl(&dir)
        .arg("plan")
        .arg(&plan_path)
        .arg("--output")
        .arg(&report_path)
        .args(["--cooldown-ms", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("did not resolve"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    let jobs = report["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[1]["skipped"], true);
    assert_eq!(jobs[2]["name"], "[b]SSDLoadInjector(d30)");
    assert_eq!(report["aborted"], false);
}

#[test]
fn test_plan_missing_file() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .args(["plan", "does-not-exist.json"])
        .assert()
        .code(3);
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join("harness.toml").exists());

    // second init without --force refuses to overwrite
    loadinjectctl(&dir).args(["config", "init"]).assert().failure();
    loadinjectctl(&dir).args(["config", "init", "--force"]).assert().success();

    loadinjectctl(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_pause_ms = 10"));

    loadinjectctl(&dir).args(["config", "validate"]).assert().success();
}

#[test]
fn test_config_show_path() {
    let dir = TempDir::new().unwrap();
    loadinjectctl(&dir)
        .args(["config", "show", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harness.toml"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("harness.toml"), "[injector]\nblock_size = 0\n").unwrap();

    loadinjectctl(&dir)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration Error"));
}
