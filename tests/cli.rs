use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn budgetplan(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("budgetplan").expect("bin");
    cmd.env("BUDGET_PLANNER_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn run(data_dir: &TempDir, args: &[&str]) -> String {
    let output = budgetplan(data_dir).args(args).output().expect("run");
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8")
}

fn create_trip(data_dir: &TempDir) {
    run(data_dir, &["project", "create", "Trip", "--start", "2026-06-01"]);
}

#[test]
fn init_writes_settings() {
    let data_dir = TempDir::new().unwrap();
    budgetplan(&data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));

    assert!(data_dir.path().join("config.json").exists());
    assert!(data_dir.path().join("data").join("projects.json").exists());
}

#[test]
fn config_shows_currency() {
    let data_dir = TempDir::new().unwrap();
    budgetplan(&data_dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Currency symbol: €"));
}

#[test]
fn tree_totals_roll_up() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);

    run(&data_dir, &["tree", "add-category", "Trip", "Transport"]);
    run(&data_dir, &["tree", "add-subcategory", "Trip", "1", "Flights"]);
    let out = run(
        &data_dir,
        &["tree", "add-line", "Trip", "1.1", "Outbound", "€ 120,50"],
    );
    assert!(out.contains("Added 1.1.1"));
    assert!(out.contains("Trip  [€ 120,50]"));

    budgetplan(&data_dir)
        .args(["project", "show", "trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total budget: € 120,50"))
        .stdout(predicate::str::contains("1.1 Flights  € 120,50"));
}

#[test]
fn set_total_then_clear_restores_it() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);

    budgetplan(&data_dir)
        .args(["project", "set-total", "Trip", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total budget: € 500,00 (original)"));

    budgetplan(&data_dir)
        .args(["project", "set-total", "Trip", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total budget: € 500,00 (original)"));
}

#[test]
fn cleared_total_is_not_replaced_by_category_sum() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);
    run(&data_dir, &["project", "set-total", "Trip", "500"]);
    run(&data_dir, &["tree", "add-category", "Trip", "Transport"]);
    run(&data_dir, &["tree", "set-amount", "Trip", "1", "300"]);

    budgetplan(&data_dir)
        .args(["project", "set-total", "Trip", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total budget: € 500,00 (original)"));

    budgetplan(&data_dir)
        .args(["project", "show", "Trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total budget: € 500,00"))
        .stdout(predicate::str::contains("1 Transport  € 300,00"));
}

#[test]
fn history_records_edits() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);
    run(&data_dir, &["tree", "add-category", "Trip", "Food"]);

    budgetplan(&data_dir)
        .args(["project", "history", "Trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE Project"))
        .stdout(predicate::str::contains("CREATE Category"));
}

#[test]
fn missing_project_fails() {
    let data_dir = TempDir::new().unwrap();
    budgetplan(&data_dir)
        .args(["project", "show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project not found"));
}

#[test]
fn wrong_depth_is_rejected() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);
    run(&data_dir, &["tree", "add-category", "Trip", "Transport"]);

    budgetplan(&data_dir)
        .args(["tree", "add-line", "Trip", "1", "Taxi", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a subcategory position"));
}

#[test]
fn legacy_projects_are_listed() {
    let data_dir = TempDir::new().unwrap();
    let data = data_dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("budget_projects.json"),
        r#"[{"id": "1712345678", "projectName": "Old kitchen",
             "projectDate": "2024-03-01", "totalBudget": "€ 2500,00"}]"#,
    )
    .unwrap();

    budgetplan(&data_dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Old kitchen"))
        .stdout(predicate::str::contains("€ 2500,00"))
        .stdout(predicate::str::contains("(legacy)"));
}

#[test]
fn delete_requires_force() {
    let data_dir = TempDir::new().unwrap();
    create_trip(&data_dir);

    budgetplan(&data_dir)
        .args(["project", "delete", "Trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    run(&data_dir, &["project", "delete", "Trip", "--force"]);
    budgetplan(&data_dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects found"));
}
