use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

/// Challenges shipped in the config written by `sqlgym init`.
const SAMPLE_CHALLENGES: usize = 30;

fn sqlgym() -> Command {
    let mut cmd = Command::cargo_bin("sqlgym").unwrap();
    cmd.env_remove("SQLGYM_LOG")
        .env_remove("SQLGYM_MAX_POOL_SIZE")
        .env_remove("SQLGYM_MAX_INSTANCES")
        .env_remove("SQLGYM_TIMEOUT_MS");
    cmd
}

fn init_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sqlgym.yaml");
    sqlgym()
        .arg("init")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stderr(contains("created"));
    path
}

#[test]
fn run_prints_aligned_table() {
    let re = regex::Regex::new(r"completed in \d+ms").unwrap();
    sqlgym()
        .args([
            "run",
            "--schema",
            "movies",
            "--sql",
            "SELECT title, rating FROM movies WHERE id = 1",
        ])
        .assert()
        .success()
        .stdout(contains("title     | rating"))
        .stdout(contains("Inception | 8.8"))
        .stdout(contains("(1 row)"))
        .stderr(predicate::function(move |s: &str| re.is_match(s)));
}

#[test]
fn run_json_and_csv_formats() {
    sqlgym()
        .args(["run", "--schema", "ecommerce", "--format", "json"])
        .args(["--sql", "SELECT name FROM products WHERE id = 3"])
        .assert()
        .success()
        .stdout(contains("\"name\": \"Standing Desk\""));

    sqlgym()
        .args(["run", "--schema", "ecommerce", "--format", "csv"])
        .args(["--sql", "SELECT 'a,b' AS label, 1 AS n"])
        .assert()
        .success()
        .stdout("label,n\n\"a,b\",1\n");

    sqlgym()
        .args(["run", "--schema", "ecommerce", "--format", "csv"])
        .args(["--sql", "SELECT * FROM products WHERE price < 0"])
        .assert()
        .code(1)
        .stderr(contains("no rows to export"));
}

#[test]
fn run_reads_sql_from_file() {
    let dir = TempDir::new().unwrap();
    let sql = dir.path().join("query.sql");
    fs::write(&sql, "SELECT count(*) AS n FROM employees;\n").unwrap();

    sqlgym()
        .args(["run", "--schema", "employees", "--file"])
        .arg(&sql)
        .assert()
        .success()
        .stdout(contains("10"));
}

#[test]
fn run_reports_engine_errors() {
    sqlgym()
        .args(["run", "--schema", "movies", "--sql", "SELEC 1"])
        .assert()
        .code(1)
        .stderr(contains("error:"))
        .stderr(contains("syntax error"));
}

#[test]
fn unknown_schema_is_a_config_error() {
    sqlgym()
        .args(["run", "--schema", "payroll", "--sql", "SELECT 1"])
        .assert()
        .code(2)
        .stderr(contains("unknown database 'payroll'"));
}

#[test]
fn init_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = init_config(&dir);
    sqlgym()
        .arg("init")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stderr(contains("already exists"));
}

#[test]
fn check_passes_and_fails_with_diff() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    sqlgym()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--challenge", "eco-status-count"])
        .args(["--sql", "SELECT status, COUNT(*) FROM orders GROUP BY status"])
        .assert()
        .success()
        .stderr(contains("+50 points"));

    sqlgym()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--challenge", "eco-status-count"])
        .args(["--sql", "SELECT status, COUNT(*) FROM orders WHERE status <> 'pending' GROUP BY status"])
        .assert()
        .code(1)
        .stderr(contains("❌"))
        .stderr(contains("missing from your result (1):"))
        .stderr(contains("(pending, 1)"));
}

#[test]
fn check_json_outcome() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    sqlgym()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--challenge", "mov-top-rated", "--format", "json"])
        .args(["--sql", "SELECT nope FROM movies"])
        .assert()
        .code(1)
        .stdout(contains("\"status\": \"failed\""))
        .stdout(contains("no such column"));
}

#[test]
fn check_unknown_challenge() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    sqlgym()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--challenge", "nope", "--sql", "SELECT 1"])
        .assert()
        .code(2)
        .stderr(contains("no challenge 'nope'"));
}

#[test]
fn solutions_self_test_passes() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    sqlgym()
        .arg("solutions")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(contains(format!(
            "Summary: {} passed, 0 failed, 0 errors",
            SAMPLE_CHALLENGES
        )))
        .stderr(contains("exhausted").not());

    sqlgym()
        .arg("solutions")
        .arg("--config")
        .arg(&config)
        .args(["--difficulty", "advanced"])
        .assert()
        .success()
        .stderr(contains("Summary: 8 passed, 0 failed, 0 errors"));
}

#[test]
fn solutions_switch_schemas_within_a_small_pool() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("small.yaml");
    fs::write(
        &config,
        r#"
configVersion: 1
settings:
  pool:
    max_pool_size: 2
    max_total_instances: 4
challenges:
  - { id: e1, title: E1, database: employees, solution_sql: SELECT count(*) FROM employees }
  - { id: m1, title: M1, database: movies, solution_sql: SELECT count(*) FROM movies }
  - { id: e2, title: E2, database: employees, solution_sql: SELECT name FROM departments }
  - { id: m2, title: M2, database: movies, solution_sql: SELECT name FROM actors }
  - { id: c1, title: C1, database: ecommerce, solution_sql: SELECT name FROM products }
"#,
    )
    .unwrap();

    for _ in 0..5 {
        sqlgym()
            .arg("solutions")
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stderr(contains("Summary: 5 passed, 0 failed, 0 errors"))
            .stderr(contains("exhausted").not());
    }
}

#[test]
fn solutions_report_broken_challenge() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.yaml");
    fs::write(
        &config,
        r#"
configVersion: 1
challenges:
  - id: broken
    title: Broken
    database: movies
    solution_sql: SELECT missing_column FROM movies
"#,
    )
    .unwrap();

    sqlgym()
        .arg("solutions")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("💥 broken"))
        .stderr(contains("Summary: 0 passed, 0 failed, 1 errors"));
}

#[test]
fn strict_config_rejects_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("sqlgym.yaml");
    fs::write(&config, "configVersion: 1\nsuite: legacy\nchallenges: []\n").unwrap();

    sqlgym()
        .arg("solutions")
        .arg("--config")
        .arg(&config)
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("Unknown fields"));
}

#[test]
fn schemas_lists_catalog() {
    sqlgym()
        .arg("schemas")
        .assert()
        .success()
        .stdout(contains("employees"))
        .stdout(contains("order_items"))
        .stdout(contains("movie_directors"));

    sqlgym()
        .args(["schemas", "--schema", "movies", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"movies\""))
        .stdout(contains("\"employees\"").not());
}
