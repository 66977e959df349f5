//! Command-line evaluation of the two-bus fixtures

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn gridscore() -> Command {
    Command::cargo_bin("gridscore").unwrap()
}

fn evaluate_args(solution: &str) -> Vec<String> {
    vec![
        "evaluate".into(),
        "--problem".into(),
        data_path("two_bus_problem.json").display().to_string(),
        "--solution".into(),
        data_path(solution).display().to_string(),
    ]
}

#[test]
fn evaluate_prints_objective_table() {
    gridscore()
        .args(evaluate_args("two_bus_solution.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("z_k_worst_case"))
        .stdout(predicate::str::contains("30.000000"))
        .stdout(predicate::str::contains("viol_t_connected_base").not());
}

#[test]
fn evaluate_json_summary() {
    let output = gridscore()
        .args(evaluate_args("two_bus_solution.json"))
        .args(["--format", "json", "--log-level", "warn"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((summary["z"].as_f64().unwrap() - 30.0).abs() < 1e-9);
    assert_eq!(summary["infeas"], 0);
    assert_eq!(summary["viol_sh_t_u_st_max"], serde_json::Value::Null);
    assert_eq!(summary["info_connected_base"]["violation"], false);
}

#[test]
fn open_line_is_reported_infeasible() {
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("report.json");
    gridscore()
        .args(evaluate_args("two_bus_solution_open_line.json"))
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("viol_t_connected_base"))
        .stdout(predicate::str::contains("yes"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["summary"]["infeas"], 1);
    assert_eq!(report["infeasibility"]["viol_t_connected_base"]["val"], 1.0);
    assert_eq!(report["summary"]["info_connected_base"]["i1"], "b1");
}

#[test]
fn config_can_forbid_line_switching() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("eval.toml");
    fs::write(&config, "acl_switch_dn_allowed = false\n").unwrap();
    let out = tmp.path().join("report.json");
    gridscore()
        .args(evaluate_args("two_bus_solution_open_line.json"))
        .args(["--config", config.to_str().unwrap()])
        .args(["--out", out.to_str().unwrap()])
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["infeasibility"]["viol_acl_t_u_sd_max"]["val"], 1.0);
}

#[test]
fn invalid_config_fails() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("eval.toml");
    fs::write(&config, "time_eq_tol = -1.0\n").unwrap();
    gridscore()
        .args(evaluate_args("two_bus_solution.json"))
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("time_eq_tol"));
}

#[test]
fn check_rejects_wrong_horizon() {
    let tmp = tempdir().unwrap();
    let solution = tmp.path().join("solution.json");
    let contents = fs::read_to_string(data_path("two_bus_solution.json"))
        .unwrap()
        .replace("\"v\": [[1.0], [1.0]]", "\"v\": [[1.0, 1.0], [1.0, 1.0]]");
    fs::write(&solution, contents).unwrap();

    gridscore()
        .args([
            "check",
            "--problem",
            data_path("two_bus_problem.json").to_str().unwrap(),
            "--solution",
            solution.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bus.v"));
}

#[test]
fn check_accepts_matching_inputs() {
    gridscore()
        .args([
            "check",
            "--problem",
            data_path("two_bus_problem.json").to_str().unwrap(),
            "--solution",
            data_path("two_bus_solution.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inputs OK: 1 intervals, 2 buses, 2 devices"));
}

#[test]
fn check_fails_on_zero_impedance_line() {
    let tmp = tempdir().unwrap();
    let problem = tmp.path().join("problem.json");
    let contents = fs::read_to_string(data_path("two_bus_problem.json"))
        .unwrap()
        .replace("\"x\": 0.1", "\"x\": 0.0");
    fs::write(&problem, contents).unwrap();

    gridscore()
        .args([
            "check",
            "--problem",
            problem.to_str().unwrap(),
            "--solution",
            data_path("two_bus_solution.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error:branch] l0: zero series impedance"))
        .stderr(predicate::str::contains("1 input error(s)"));
}

#[test]
fn missing_problem_file_fails() {
    gridscore()
        .args([
            "evaluate",
            "--problem",
            "does_not_exist.json",
            "--solution",
            data_path("two_bus_solution.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading problem"));
}
